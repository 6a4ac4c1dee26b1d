//! The deep-research flow.
//!
//! A [`ResearchSession`] owns at most one result bundle at a time plus
//! the per-row expansion state of its rendering. A new request clears
//! the prior bundle before going out and replaces it wholesale on
//! success; there is no partial-result state. URL validation happens
//! before any network call: empty targets and hosts off the allow-list
//! never reach the backend.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LensError;
use crate::lens::client::{LensApi, ResearchRequest};
use crate::lens::sanitize::sanitize_legal_content;
use crate::lens::types::{LensDocument, ResearchBundle, ResearchMode};

/// Collapsed rows render this many sanitized chars.
pub const PREVIEW_CHARS: usize = 500;

pub struct ResearchSession {
    api: Arc<dyn LensApi>,
    allowed_domains: Vec<String>,
    bundle: Option<ResearchBundle>,
    expanded: HashMap<usize, bool>,
}

impl ResearchSession {
    pub fn new(api: Arc<dyn LensApi>, allowed_domains: Vec<String>) -> Self {
        Self {
            api,
            allowed_domains,
            bundle: None,
            expanded: HashMap::new(),
        }
    }

    pub fn bundle(&self) -> Option<&ResearchBundle> {
        self.bundle.as_ref()
    }

    /// Id of the most recent bundle, the handle the document assistant
    /// is gated on.
    pub fn last_document_id(&self) -> Option<&str> {
        self.bundle.as_ref().map(|b| b.document_id.as_str())
    }

    /// Check a research target before any network traffic.
    pub fn validate_url(&self, url: &str) -> Result<(), LensError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(LensError::Validation("Please enter a valid URL.".to_string()));
        }

        let parsed = url::Url::parse(trimmed).map_err(|_| self.disallowed_host_error())?;
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        let host = host.trim_end_matches('.');

        let allowed = self.allowed_domains.iter().any(|domain| {
            host == domain.as_str() || host.ends_with(&format!(".{domain}"))
        });
        if !allowed {
            return Err(self.disallowed_host_error());
        }
        Ok(())
    }

    fn disallowed_host_error(&self) -> LensError {
        LensError::Validation(format!(
            "Please enter a valid Kenya Law URL ({}).",
            self.allowed_domains.join(", ")
        ))
    }

    /// Issue one research request. The prior bundle and expansion state
    /// are dropped before the request; on failure the session stays
    /// empty rather than showing stale results.
    pub async fn run_research(
        &mut self,
        url: &str,
        mode: ResearchMode,
    ) -> Result<&ResearchBundle, LensError> {
        self.validate_url(url)?;

        self.bundle = None;
        self.expanded.clear();

        let request = ResearchRequest {
            url: url.trim().to_string(),
            limit: mode.page_limit(),
            research_links: mode.follow_links(),
        };
        let bundle = self.api.research(request).await?;
        tracing::info!(
            document_id = %bundle.document_id,
            total_pages = bundle.total_pages,
            "research completed"
        );

        Ok(self.bundle.insert(bundle))
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(&index).copied().unwrap_or(false)
    }

    /// Flip one row's expanded flag. Pure rendering state; bundle data
    /// is untouched.
    pub fn toggle_expanded(&mut self, index: usize) {
        let entry = self.expanded.entry(index).or_insert(false);
        *entry = !*entry;
    }

    /// Sanitized content for one row: the full text when expanded, a
    /// bounded preview otherwise.
    pub fn rendered_content(&self, index: usize) -> Option<String> {
        let doc = self.bundle.as_ref()?.results.get(index)?;
        let sanitized = sanitize_legal_content(doc.content.as_deref()?);
        if sanitized.is_empty() {
            return None;
        }
        if self.is_expanded(index) {
            return Some(sanitized);
        }
        let preview: String = sanitized.chars().take(PREVIEW_CHARS).collect();
        if sanitized.chars().count() > PREVIEW_CHARS {
            Some(format!("{preview}…"))
        } else {
            Some(preview)
        }
    }

    /// Displayed character count: the backend's figure when present,
    /// the sanitized length otherwise.
    pub fn content_length(doc: &LensDocument) -> usize {
        doc.content_length.unwrap_or_else(|| {
            doc.content
                .as_deref()
                .map(|c| sanitize_legal_content(c).chars().count())
                .unwrap_or(0)
        })
    }
}
