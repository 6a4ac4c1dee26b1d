//! Deep research over Kenya Law: crawl client, result session, and
//! content sanitization.

pub mod client;
pub mod research;
pub mod sanitize;
pub mod types;

pub use client::{DocumentChatBackend, HttpLensClient, LensApi, ResearchRequest};
pub use research::ResearchSession;
pub use types::{LensDocument, ResearchBundle, ResearchMode};
