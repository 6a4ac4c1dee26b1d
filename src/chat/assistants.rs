//! Shell presets for the three assistant surfaces.
//!
//! The presets differ only in context building, gating, and fixed
//! strings; the exchange machine itself lives in [`super::shell`].

use crate::chat::message::TurnRole;
use crate::chat::shell::{ChatShell, ContextMode, GateRefusalStyle, ShellProfile};
use crate::lens::types::LensDocument;

const HAKIBOT_SYSTEM_PROMPT: &str = "You are HakiBot, a helpful AI legal assistant specializing in Kenyan law. \
Provide clear, accurate, and practical legal guidance. Always remind users that for personalized legal advice, \
they should consult with a qualified lawyer. Be concise but thorough in your responses.";

const HAKIBOT_GREETING: &str = "Hi! I'm HakiBot, your AI legal assistant. I can help you understand Kenyan law, \
legal processes, and guide you to the right resources. What legal question can I help you with today?";

/// Quick prompts offered by the general assistant.
pub const QUICK_QUESTIONS: &[&str] = &[
    "What are my rights as a tenant in Kenya?",
    "How do I file for divorce in Kenya?",
    "What is the process for registering a business?",
    "How do I report domestic violence?",
];

/// Categorized starters for the document assistant.
pub const SUGGESTED_QUESTIONS: &[(&str, &str)] = &[
    ("Legal Analysis", "What are the key provisions of this document?"),
    ("Factual", "Which parties and dates does this document mention?"),
    ("Content Summary", "Summarize the objectives stated in the document."),
    ("Legal Definitions", "Explain the key terms defined in the document."),
    ("Legal Framework", "What cooperation or enforcement mechanisms are established?"),
    ("Compliance", "What are the monitoring and control provisions?"),
];

/// The general legal assistant: ungated, full-transcript context.
pub fn hakibot() -> ChatShell {
    ChatShell::new(
        ShellProfile {
            name: "hakibot",
            system_prompt: Some(HAKIBOT_SYSTEM_PROMPT),
            empty_reply_fallback: "I apologize, but I couldn't generate a response. Please try again.",
            error_prefix: "Error: ",
            error_suffix: "\n\nPlease check your API configuration in the environment.",
        },
        ContextMode::Transcript,
    )
    .with_opening_turn(TurnRole::Assistant, HAKIBOT_GREETING)
}

/// Case chat bound to one researched document. A missing research id is
/// surfaced as an error turn.
pub fn case_chat(document: &LensDocument, document_id: Option<String>) -> ChatShell {
    let title = document
        .title
        .clone()
        .unwrap_or_else(|| "Legal Document Chat".to_string());

    ChatShell::new(
        ShellProfile {
            name: "case-chat",
            system_prompt: None,
            empty_reply_fallback: "I couldn't generate a response for that question.",
            error_prefix: "Sorry, I ran into a problem: ",
            error_suffix: "",
        },
        ContextMode::BoundDocument {
            title: document.title.clone(),
            url: document.url.clone(),
            excerpt: document.content.clone(),
        },
    )
    .with_document_gate(document_id, GateRefusalStyle::ErrorTurn)
    .with_opening_turn(
        TurnRole::System,
        format!(
            "I'm ready to discuss \"{title}\". Ask about key issues, legal implications, or procedural posture."
        ),
    )
}

/// The document assistant: user-supplied document id, tagged-history
/// context, silent gate (the UI disables send until an id is present).
pub fn document_assistant(document_id: Option<String>) -> ChatShell {
    ChatShell::new(
        ShellProfile {
            name: "document-assistant",
            system_prompt: None,
            empty_reply_fallback: "I couldn't find an answer to that question in the document.",
            error_prefix: "",
            error_suffix: "",
        },
        ContextMode::TaggedHistory,
    )
    .with_document_gate(document_id, GateRefusalStyle::Silent)
}

#[cfg(test)]
mod tests {
    use crate::chat::message::TurnRole;
    use crate::lens::types::LensDocument;

    #[test]
    fn case_chat_opens_with_document_title() {
        let doc = LensDocument {
            title: Some("Republic v Ochieng".to_string()),
            url: Some("https://new.kenyalaw.org/akn/ke/judgment/1".to_string()),
            content: Some("The appellant...".to_string()),
            content_length: None,
        };
        let shell = super::case_chat(&doc, Some("doc_1".to_string()));
        assert_eq!(shell.turns().len(), 1);
        assert_eq!(shell.turns()[0].role, TurnRole::System);
        assert!(shell.turns()[0].text.contains("Republic v Ochieng"));
    }

    #[test]
    fn document_assistant_starts_empty_and_ungated_ids_are_trimmed() {
        let mut shell = super::document_assistant(Some("   ".to_string()));
        assert!(shell.turns().is_empty());
        assert_eq!(shell.document_id(), None);
        shell.set_document_id(" doc_7 ");
        assert_eq!(shell.document_id(), Some("doc_7"));
    }
}
