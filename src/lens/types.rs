//! Research domain types.

use serde::Deserialize;

/// How a research request walks the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResearchMode {
    /// Detect whether the URL is a listing or a single document.
    AutoDetect,
    /// Crawl a paginated listing of cases or documents.
    ListingCrawl,
    /// Research exactly one case or document page.
    SingleCase,
}

impl ResearchMode {
    /// Result-count ceiling requested from the crawl backend.
    pub fn page_limit(&self) -> u32 {
        match self {
            Self::AutoDetect | Self::ListingCrawl => 10,
            Self::SingleCase => 1,
        }
    }

    /// Whether the backend may follow links off the target page.
    pub fn follow_links(&self) -> bool {
        !matches!(self, Self::SingleCase)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AutoDetect => "Auto Detect",
            Self::ListingCrawl => "Listing Crawl",
            Self::SingleCase => "Single Document",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AutoDetect => "Automatically detects and researches cases or document listings.",
            Self::ListingCrawl => "Crawls through paginated case listings and document collections.",
            Self::SingleCase => "Research a single case or document page in detail.",
        }
    }
}

/// One researched document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LensDocument {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub content_length: Option<usize>,
}

/// The wholesale result of one research request. Read-only after
/// creation; shells reference documents out of it but never mutate it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchBundle {
    pub document_id: String,
    pub total_pages: u32,
    pub duration: Option<f64>,
    #[serde(default)]
    pub results: Vec<LensDocument>,
}

impl ResearchBundle {
    /// Banner line shown after a successful research run.
    pub fn summary(&self) -> String {
        format!(
            "Successfully researched {} page{} in {}",
            self.total_pages,
            if self.total_pages == 1 { "" } else { "s" },
            self.duration_text()
        )
    }

    pub fn duration_text(&self) -> String {
        match self.duration {
            Some(seconds) => format!("{seconds:.2}s"),
            None => "—".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedUrlKind {
    Listing,
    Single,
}

impl SuggestedUrlKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Single => "single",
        }
    }
}

/// A curated starting point for research.
#[derive(Debug, Clone, Copy)]
pub struct SuggestedUrl {
    pub url: &'static str,
    pub description: &'static str,
    pub kind: SuggestedUrlKind,
}

/// Curated Kenya Law entry points offered before the first search.
pub fn suggested_urls() -> &'static [SuggestedUrl] {
    &[
        SuggestedUrl {
            url: "https://new.kenyalaw.org/judgments/",
            description: "Recent judgments across all superior courts",
            kind: SuggestedUrlKind::Listing,
        },
        SuggestedUrl {
            url: "https://new.kenyalaw.org/legislation/",
            description: "Laws of Kenya, consolidated legislation",
            kind: SuggestedUrlKind::Listing,
        },
        SuggestedUrl {
            url: "https://new.kenyalaw.org/judgments/court-class/superior-courts/",
            description: "Superior court decisions by court class",
            kind: SuggestedUrlKind::Listing,
        },
        SuggestedUrl {
            url: "https://new.kenyalaw.org/akn/ke/act/2010/constitution",
            description: "The Constitution of Kenya, 2010",
            kind: SuggestedUrlKind::Single,
        },
    ]
}
