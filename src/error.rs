//! Crate-wide error types.
//!
//! Each boundary gets its own error enum so callers can match on what
//! actually went wrong instead of string-scraping. Cancellation is a
//! first-class variant, not an error message, because the chat shells
//! must render it differently from a failure.

use thiserror::Error;

/// Configuration resolution failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("missing required setting {key}")]
    Missing { key: String },

    #[error("failed to read settings file '{path}': {reason}")]
    SettingsFile { path: String, reason: String },
}

/// Failures from the chat-completion and document-chat collaborators.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The user signalled the cancel token while the request was in flight.
    #[error("request cancelled")]
    Cancelled,

    #[error("chat endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("failed to reach chat endpoint: {0}")]
    Transport(String),

    #[error("chat endpoint returned an unreadable response: {0}")]
    Decode(String),
}

impl ChatError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures from the research (lens) flow.
///
/// `Validation` is surfaced before any network call is made; everything
/// else comes back from the crawl backend.
#[derive(Debug, Error)]
pub enum LensError {
    #[error("{0}")]
    Validation(String),

    #[error("research endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("failed to reach research endpoint: {0}")]
    Transport(String),

    #[error("research endpoint returned an unreadable response: {0}")]
    Decode(String),
}

impl LensError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for LensError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
