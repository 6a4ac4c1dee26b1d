//! Conversation turns.

use chrono::{DateTime, Utc};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
    /// Shell-generated framing, e.g. the welcome line in case chat.
    System,
    /// A failed exchange. Rendered with error tone but kept in history.
    Error,
}

impl TurnRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "HakiBot",
            Self::System => "System",
            Self::Error => "Error",
        }
    }
}

/// One entry in a conversation. Owned exclusively by the shell that
/// created it.
#[derive(Debug, Clone)]
pub struct Turn {
    pub id: u64,
    pub role: TurnRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Source URLs attached by the document-chat collaborator.
    pub references: Vec<String>,
    pub confidence: Option<f32>,
}

impl Turn {
    pub fn new(id: u64, role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            created_at: Utc::now(),
            references: Vec::new(),
            confidence: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.role == TurnRole::Error
    }
}

/// Locally unique, monotonic turn ids seeded from wall-clock millis so
/// exported transcripts sort naturally across sessions.
#[derive(Debug)]
pub struct TurnIdSource {
    last: u64,
}

impl TurnIdSource {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    pub fn next(&mut self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.last = now.max(self.last + 1);
        self.last
    }
}

impl Default for TurnIdSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Render turns as a plain-text transcript, one speaker-tagged block per
/// turn, matching the export format of the original assistant.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| {
            format!(
                "[{}] {}: {}",
                turn.created_at.format("%H:%M"),
                match turn.role {
                    TurnRole::User => "Lawyer",
                    _ => "HakiBot",
                },
                turn.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
