//! Conversational shells and the exchange state machine.

pub mod assistants;
pub mod message;
pub mod shell;

pub use message::{Turn, TurnRole};
pub use shell::{ChatBackend, ChatReply, ChatShell, Outbound, SubmitRefusal};
