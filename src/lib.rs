//! HakiLens: a terminal-first Kenyan legal research assistant.
//!
//! Library layout:
//! - [`chat`] — the parameterized conversational exchange state machine
//!   and the three assistant presets built on it;
//! - [`lens`] — deep research over Kenya Law (crawl client, result
//!   session, content sanitization);
//! - [`llm`] — the chat-completion collaborator;
//! - [`matter`] — local matter (case/client) context;
//! - [`cancel`] — cooperative cancellation for in-flight exchanges;
//! - [`config`] / [`settings`] — env-over-file configuration;
//! - [`repl`] — the interactive terminal surfaces.

pub mod cancel;
pub mod chat;
pub mod config;
pub mod error;
pub mod lens;
pub mod llm;
pub mod matter;
pub mod repl;
pub mod settings;
