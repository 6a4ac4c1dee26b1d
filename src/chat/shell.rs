//! The conversational exchange state machine.
//!
//! One parameterized shell backs all three assistant surfaces (general
//! assistant, case chat, document assistant) instead of three copies.
//! A shell owns its turn list exclusively and allows at most one
//! outstanding exchange:
//!
//! ```text
//! idle --begin_exchange--> awaiting-response --complete_exchange--> idle
//!        (user turn +                          (placeholder replaced by
//!         placeholder appended)                 exactly one terminal turn)
//! ```
//!
//! `begin_exchange` refuses empty input, a busy shell, and an
//! unsatisfied document-id gate without touching the network. The
//! placeholder is always replaced by exactly one terminal turn:
//! assistant text on success, the fixed cancellation line when the
//! cancel token fired, or an error-toned turn otherwise. Nothing is
//! retried automatically.

use async_trait::async_trait;

use crate::cancel::{CancelHandle, CancelToken, cancel_pair};
use crate::chat::message::{Turn, TurnIdSource, TurnRole, render_transcript};
use crate::error::ChatError;

/// Fixed text appended when a document-gated shell is asked to send
/// without an id.
pub const MISSING_DOCUMENT_ID_TEXT: &str =
    "This document is missing a reference ID from the Kenya Law research results.";

/// Terminal turn text for a user-cancelled exchange. Deliberately not
/// error-toned.
pub const CANCELLED_TEXT: &str = "Request cancelled.";

const PLACEHOLDER_TEXT: &str = "Thinking...";

/// A successful reply from a chat collaborator.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub content: String,
    pub references: Vec<String>,
    pub confidence: Option<f32>,
}

/// Everything a backend needs to issue the network call for one
/// exchange. Produced by [`ChatShell::begin_exchange`].
#[derive(Debug)]
pub struct Outbound {
    pub prompt: String,
    pub system: Option<String>,
    pub context: String,
    pub document_id: Option<String>,
    pub token: CancelToken,
}

/// The request collaborator a shell sends exchanges through.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, outbound: Outbound) -> Result<ChatReply, ChatError>;
}

/// Why a submission was refused. No network call was made and, except
/// for a gate refusal configured to append an error turn, the turn list
/// is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRefusal {
    /// Empty or whitespace-only input.
    Empty,
    /// An exchange is already in flight on this shell.
    Busy,
    /// The shell requires a document id and none is set.
    MissingDocumentId,
}

/// What a document-gated shell does when the gate is unsatisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRefusalStyle {
    /// Refuse without trace (the document assistant disables its send
    /// control instead).
    Silent,
    /// Append a fixed error turn so the refusal is visible in history.
    ErrorTurn,
}

#[derive(Debug, Clone)]
enum Gate {
    Open,
    DocumentId {
        id: Option<String>,
        on_missing: GateRefusalStyle,
    },
}

/// How the contextual preamble for an exchange is built.
#[derive(Debug, Clone)]
pub enum ContextMode {
    /// Full prior transcript, speaker-tagged (general assistant).
    Transcript,
    /// Title, URL, and a bounded excerpt of one researched document
    /// (case chat).
    BoundDocument {
        title: Option<String>,
        url: Option<String>,
        excerpt: Option<String>,
    },
    /// Prior user/assistant turns as `User:` / `AI:` lines (document
    /// assistant).
    TaggedHistory,
}

/// Chars of document content forwarded as excerpt context.
const EXCERPT_LIMIT: usize = 500;

/// Per-variant fixed strings.
#[derive(Debug, Clone)]
pub struct ShellProfile {
    pub name: &'static str,
    pub system_prompt: Option<&'static str>,
    /// Shown in place of the assistant turn when the reply is blank.
    pub empty_reply_fallback: &'static str,
    pub error_prefix: &'static str,
    pub error_suffix: &'static str,
}

#[derive(Debug)]
struct InFlight {
    placeholder_id: u64,
    handle: CancelHandle,
}

/// A conversational shell instance. See the module docs for the state
/// machine contract.
#[derive(Debug)]
pub struct ChatShell {
    profile: ShellProfile,
    context_mode: ContextMode,
    gate: Gate,
    turns: Vec<Turn>,
    ids: TurnIdSource,
    draft: String,
    in_flight: Option<InFlight>,
}

impl ChatShell {
    pub fn new(profile: ShellProfile, context_mode: ContextMode) -> Self {
        Self {
            profile,
            context_mode,
            gate: Gate::Open,
            turns: Vec::new(),
            ids: TurnIdSource::new(),
            draft: String::new(),
            in_flight: None,
        }
    }

    /// Require a non-empty document id before any exchange is issued.
    pub fn with_document_gate(mut self, id: Option<String>, on_missing: GateRefusalStyle) -> Self {
        self.gate = Gate::DocumentId {
            id: id.filter(|v| !v.trim().is_empty()),
            on_missing,
        };
        self
    }

    /// Seed an opening turn (greeting or system welcome line).
    pub fn with_opening_turn(mut self, role: TurnRole, text: impl Into<String>) -> Self {
        let id = self.ids.next();
        self.turns.push(Turn::new(id, role, text));
        self
    }

    pub fn profile(&self) -> &ShellProfile {
        &self.profile
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn document_id(&self) -> Option<&str> {
        match &self.gate {
            Gate::DocumentId { id, .. } => id.as_deref(),
            Gate::Open => None,
        }
    }

    /// Update the gating document id (the document assistant lets the
    /// user edit it between exchanges).
    pub fn set_document_id(&mut self, id: impl Into<String>) {
        if let Gate::DocumentId { id: slot, .. } = &mut self.gate {
            let value = id.into();
            *slot = if value.trim().is_empty() {
                None
            } else {
                Some(value.trim().to_string())
            };
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Stage text in the input draft (suggested questions land here).
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Render the full transcript of this shell.
    pub fn transcript(&self) -> String {
        render_transcript(&self.turns)
    }

    /// Drop all history. Refused while an exchange is in flight so the
    /// placeholder invariant cannot be broken.
    pub fn clear(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.turns.clear();
        true
    }

    /// Signal the in-flight exchange's cancel token, if any.
    pub fn cancel_in_flight(&self) -> bool {
        match &self.in_flight {
            Some(in_flight) => {
                in_flight.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Start one exchange: validates, appends the user turn and a
    /// placeholder, clears the draft, and hands back the outbound
    /// request. The draft is never restored, even if the exchange later
    /// fails.
    pub fn begin_exchange(&mut self, text: &str) -> Result<Outbound, SubmitRefusal> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(SubmitRefusal::Empty);
        }
        if self.in_flight.is_some() {
            return Err(SubmitRefusal::Busy);
        }

        let document_id = match &self.gate {
            Gate::Open => None,
            Gate::DocumentId { id: Some(id), .. } => Some(id.clone()),
            Gate::DocumentId {
                id: None,
                on_missing,
            } => {
                if *on_missing == GateRefusalStyle::ErrorTurn {
                    let id = self.ids.next();
                    self.turns
                        .push(Turn::new(id, TurnRole::Error, MISSING_DOCUMENT_ID_TEXT));
                }
                return Err(SubmitRefusal::MissingDocumentId);
            }
        };

        // Context reflects the conversation before this exchange.
        let context = self.build_context();

        let user_id = self.ids.next();
        self.turns
            .push(Turn::new(user_id, TurnRole::User, prompt.to_string()));

        let placeholder_id = self.ids.next();
        self.turns
            .push(Turn::new(placeholder_id, TurnRole::Assistant, PLACEHOLDER_TEXT));

        self.draft.clear();

        let (handle, token) = cancel_pair();
        self.in_flight = Some(InFlight {
            placeholder_id,
            handle,
        });

        Ok(Outbound {
            prompt: prompt.to_string(),
            system: self.profile.system_prompt.map(str::to_string),
            context,
            document_id,
            token,
        })
    }

    /// Finish the outstanding exchange, replacing the placeholder with
    /// exactly one terminal turn.
    pub fn complete_exchange(&mut self, result: Result<ChatReply, ChatError>) {
        let Some(in_flight) = self.in_flight.take() else {
            tracing::warn!(shell = self.profile.name, "completion with no exchange in flight");
            return;
        };

        // The placeholder is always the trailing turn; position lookup
        // keeps this robust if that ever changes.
        self.turns.retain(|turn| turn.id != in_flight.placeholder_id);

        let id = self.ids.next();
        let turn = match result {
            Ok(reply) => {
                let content = reply.content.trim();
                let mut turn = Turn::new(
                    id,
                    TurnRole::Assistant,
                    if content.is_empty() {
                        self.profile.empty_reply_fallback.to_string()
                    } else {
                        content.to_string()
                    },
                );
                turn.references = reply.references;
                turn.confidence = reply.confidence;
                turn
            }
            Err(ChatError::Cancelled) => Turn::new(id, TurnRole::Assistant, CANCELLED_TEXT),
            Err(err) => Turn::new(
                id,
                TurnRole::Error,
                format!(
                    "{}{}{}",
                    self.profile.error_prefix, err, self.profile.error_suffix
                ),
            ),
        };
        self.turns.push(turn);
    }

    /// Drive one full exchange through a backend. The in-flight marker
    /// is held across the await, so a concurrent caller observing the
    /// shell sees it busy.
    pub async fn send_turn(
        &mut self,
        backend: &dyn ChatBackend,
        text: &str,
    ) -> Result<(), SubmitRefusal> {
        let outbound = self.begin_exchange(text)?;
        tracing::debug!(shell = self.profile.name, chars = outbound.prompt.len(), "exchange started");
        let result = backend.send(outbound).await;
        if let Err(err) = &result {
            if err.is_cancelled() {
                tracing::info!(shell = self.profile.name, "exchange cancelled by user");
            } else {
                tracing::warn!(shell = self.profile.name, error = %err, "exchange failed");
            }
        }
        self.complete_exchange(result);
        Ok(())
    }

    /// Submit whatever is staged in the draft.
    pub async fn submit_draft(&mut self, backend: &dyn ChatBackend) -> Result<(), SubmitRefusal> {
        let text = self.draft.clone();
        self.send_turn(backend, &text).await
    }

    fn build_context(&self) -> String {
        match &self.context_mode {
            ContextMode::Transcript => render_transcript(&self.turns),
            ContextMode::BoundDocument {
                title,
                url,
                excerpt,
            } => {
                let mut lines = vec![format!(
                    "Document: {}",
                    title.as_deref().unwrap_or("Legal Document")
                )];
                if let Some(url) = url {
                    lines.push(format!("URL: {url}"));
                }
                if let Some(excerpt) = excerpt {
                    let bounded: String = excerpt.chars().take(EXCERPT_LIMIT).collect();
                    lines.push(format!("Excerpt: {bounded}"));
                }
                lines.join("\n")
            }
            ContextMode::TaggedHistory => self
                .turns
                .iter()
                .filter(|turn| matches!(turn.role, TurnRole::User | TurnRole::Assistant))
                .map(|turn| {
                    format!(
                        "{}: {}",
                        if turn.role == TurnRole::User { "User" } else { "AI" },
                        turn.text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use crate::chat::assistants;
    use crate::chat::message::TurnRole;
    use crate::error::ChatError;

    use super::{
        CANCELLED_TEXT, ChatBackend, ChatReply, ContextMode, GateRefusalStyle,
        MISSING_DOCUMENT_ID_TEXT, Outbound, ShellProfile, SubmitRefusal,
    };

    const TEST_PROFILE: ShellProfile = ShellProfile {
        name: "test",
        system_prompt: None,
        empty_reply_fallback: "No answer.",
        error_prefix: "",
        error_suffix: "",
    };

    struct ScriptedBackend {
        reply: Result<ChatReply, ChatError>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn ok(content: &str) -> Self {
            Self {
                reply: Ok(ChatReply {
                    content: content.to_string(),
                    ..ChatReply::default()
                }),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn err(err: ChatError) -> Self {
            Self {
                reply: Err(err),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, _outbound: Outbound) -> Result<ChatReply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(ChatError::Cancelled) => Err(ChatError::Cancelled),
                Err(other) => Err(ChatError::Transport(other.to_string())),
            }
        }
    }

    fn bare_shell() -> super::ChatShell {
        super::ChatShell::new(TEST_PROFILE.clone(), ContextMode::Transcript)
    }

    #[tokio::test]
    async fn exchange_appends_exactly_one_user_and_one_terminal_turn() {
        let mut shell = bare_shell();
        let backend = ScriptedBackend::ok("Here is the position under Kenyan law.");

        shell.send_turn(&backend, "Explain section 3").await.expect("accepted");

        assert_eq!(shell.turns().len(), 2);
        assert_eq!(shell.turns()[0].role, TurnRole::User);
        assert_eq!(shell.turns()[1].role, TurnRole::Assistant);
        assert_eq!(shell.turns()[1].text, "Here is the position under Kenyan law.");
        assert!(!shell.is_loading());
    }

    #[tokio::test]
    async fn failed_exchange_appends_error_turn_not_assistant_turn() {
        let mut shell = bare_shell();
        let backend = ScriptedBackend::err(ChatError::Transport("connection refused".into()));

        shell.send_turn(&backend, "hello").await.expect("accepted");

        assert_eq!(shell.turns().len(), 2);
        assert!(shell.turns()[1].is_error());
        assert!(shell.turns()[1].text.contains("connection refused"));
    }

    #[test]
    fn empty_and_whitespace_submissions_are_no_ops() {
        let mut shell = bare_shell();
        assert_eq!(shell.begin_exchange("").unwrap_err(), SubmitRefusal::Empty);
        assert_eq!(shell.begin_exchange("   \n\t").unwrap_err(), SubmitRefusal::Empty);
        assert!(shell.turns().is_empty());
    }

    #[test]
    fn second_submission_while_in_flight_is_refused() {
        let mut shell = bare_shell();
        let _outbound = shell.begin_exchange("first").expect("accepted");
        assert!(shell.is_loading());

        assert_eq!(shell.begin_exchange("second").unwrap_err(), SubmitRefusal::Busy);
        // Only the first exchange's user turn + placeholder exist.
        assert_eq!(shell.turns().len(), 2);
    }

    #[test]
    fn cancellation_yields_fixed_non_error_turn() {
        let mut shell = bare_shell();
        let outbound = shell.begin_exchange("long question").expect("accepted");
        assert!(shell.cancel_in_flight());
        assert!(outbound.token.is_cancelled());

        shell.complete_exchange(Err(ChatError::Cancelled));

        let last = shell.turns().last().expect("terminal turn");
        assert_eq!(last.role, TurnRole::Assistant);
        assert_eq!(last.text, CANCELLED_TEXT);
    }

    #[test]
    fn blank_reply_is_replaced_by_fallback() {
        let mut shell = bare_shell();
        shell.begin_exchange("q").expect("accepted");
        shell.complete_exchange(Ok(ChatReply {
            content: "   ".to_string(),
            ..ChatReply::default()
        }));
        assert_eq!(shell.turns().last().expect("turn").text, "No answer.");
    }

    #[test]
    fn missing_document_id_refuses_without_network_and_may_append_error_turn() {
        let mut loud = super::ChatShell::new(
            TEST_PROFILE.clone(),
            ContextMode::BoundDocument {
                title: Some("In re Estate".to_string()),
                url: None,
                excerpt: None,
            },
        )
        .with_document_gate(None, GateRefusalStyle::ErrorTurn);

        assert_eq!(
            loud.begin_exchange("what happened?").unwrap_err(),
            SubmitRefusal::MissingDocumentId
        );
        assert_eq!(loud.turns().len(), 1);
        assert_eq!(loud.turns()[0].text, MISSING_DOCUMENT_ID_TEXT);

        let mut silent = super::ChatShell::new(TEST_PROFILE.clone(), ContextMode::TaggedHistory)
            .with_document_gate(None, GateRefusalStyle::Silent);
        assert_eq!(
            silent.begin_exchange("q").unwrap_err(),
            SubmitRefusal::MissingDocumentId
        );
        assert!(silent.turns().is_empty());
    }

    #[test]
    fn gate_opens_once_id_is_set() {
        let mut shell = super::ChatShell::new(TEST_PROFILE.clone(), ContextMode::TaggedHistory)
            .with_document_gate(None, GateRefusalStyle::Silent);
        shell.set_document_id("doc_1762627721");

        let outbound = shell.begin_exchange("summarize").expect("gate open");
        assert_eq!(outbound.document_id.as_deref(), Some("doc_1762627721"));
    }

    #[test]
    fn draft_clears_on_submission_start_and_stays_cleared_on_failure() {
        let mut shell = bare_shell();
        shell.set_draft("my question");
        shell.begin_exchange("my question").expect("accepted");
        assert_eq!(shell.draft(), "");

        shell.complete_exchange(Err(ChatError::Transport("boom".into())));
        assert_eq!(shell.draft(), "");
    }

    #[test]
    fn bound_document_context_carries_title_url_and_bounded_excerpt() {
        let long_content = "a".repeat(2_000);
        let mut shell = super::ChatShell::new(
            TEST_PROFILE.clone(),
            ContextMode::BoundDocument {
                title: Some("Republic v Ochieng".to_string()),
                url: Some("https://new.kenyalaw.org/akn/ke/judgment/1".to_string()),
                excerpt: Some(long_content),
            },
        )
        .with_document_gate(Some("doc_9".to_string()), GateRefusalStyle::ErrorTurn);

        let outbound = shell.begin_exchange("key issues?").expect("accepted");
        assert!(outbound.context.starts_with("Document: Republic v Ochieng"));
        assert!(outbound.context.contains("URL: https://new.kenyalaw.org/akn/ke/judgment/1"));
        let excerpt_line = outbound
            .context
            .lines()
            .find(|line| line.starts_with("Excerpt: "))
            .expect("excerpt line");
        assert_eq!(excerpt_line.len(), "Excerpt: ".len() + 500);
    }

    #[test]
    fn tagged_history_context_reflects_prior_turns_only() {
        let mut shell = super::ChatShell::new(TEST_PROFILE.clone(), ContextMode::TaggedHistory)
            .with_document_gate(Some("doc_1".to_string()), GateRefusalStyle::Silent);

        let first = shell.begin_exchange("first question").expect("accepted");
        assert_eq!(first.context, "");
        shell.complete_exchange(Ok(ChatReply {
            content: "first answer".to_string(),
            ..ChatReply::default()
        }));

        let second = shell.begin_exchange("follow-up").expect("accepted");
        assert_eq!(second.context, "User: first question\nAI: first answer");
    }

    #[test]
    fn clear_is_refused_while_loading() {
        let mut shell = bare_shell();
        shell.begin_exchange("q").expect("accepted");
        assert!(!shell.clear());
        shell.complete_exchange(Ok(ChatReply::default()));
        assert!(shell.clear());
        assert!(shell.turns().is_empty());
    }

    #[tokio::test]
    async fn hakibot_preset_greets_and_formats_errors() {
        let mut shell = assistants::hakibot();
        assert_eq!(shell.turns().len(), 1);
        assert_eq!(shell.turns()[0].role, TurnRole::Assistant);

        let backend = ScriptedBackend::err(ChatError::Endpoint {
            status: 401,
            message: "invalid api key".to_string(),
        });
        shell.send_turn(&backend, "tenant rights?").await.expect("accepted");

        let last = shell.turns().last().expect("turn");
        assert!(last.is_error());
        assert!(last.text.starts_with("Error: "));
        assert!(last.text.contains("API configuration"));
    }
}
