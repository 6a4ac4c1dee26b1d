//! End-to-end flow over the public API: research a listing, then chat
//! about a researched document through the shells, with a scripted
//! research backend standing in for the network.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use hakilens::cancel::CancelToken;
use hakilens::chat::assistants;
use hakilens::chat::message::TurnRole;
use hakilens::error::{ChatError, LensError};
use hakilens::lens::client::{DocumentChatBackend, DocumentChatReply, LensApi, ResearchRequest};
use hakilens::lens::types::{LensDocument, ResearchBundle, ResearchMode};
use hakilens::lens::ResearchSession;

struct ScriptedLens {
    chat_calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedLens {
    fn new() -> Self {
        Self {
            chat_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LensApi for ScriptedLens {
    async fn research(&self, request: ResearchRequest) -> Result<ResearchBundle, LensError> {
        assert!(request.url.contains("kenyalaw.org"));
        Ok(ResearchBundle {
            document_id: "doc_1762627721".to_string(),
            total_pages: 4,
            duration: Some(2.0),
            results: vec![LensDocument {
                title: Some("Republic v Ochieng".to_string()),
                url: Some("https://new.kenyalaw.org/akn/ke/judgment/1".to_string()),
                content: Some("The appellant was charged with... $x^2$".to_string()),
                content_length: Some(40),
            }],
        })
    }

    async fn chat_with_document(
        &self,
        message: &str,
        document_id: &str,
        _context: &str,
        _token: CancelToken,
    ) -> Result<DocumentChatReply, ChatError> {
        self.chat_calls
            .lock()
            .expect("lock")
            .push((message.to_string(), document_id.to_string()));
        Ok(DocumentChatReply {
            response: Some("The court held that the charge was defective.".to_string()),
            message: None,
            document_references: vec!["https://new.kenyalaw.org/akn/ke/judgment/1".to_string()],
            confidence: Some(0.87),
        })
    }
}

#[tokio::test]
async fn research_feeds_case_chat_with_the_bundle_id() {
    let api = Arc::new(ScriptedLens::new());
    let mut session =
        ResearchSession::new(Arc::clone(&api) as Arc<dyn LensApi>, vec!["kenyalaw.org".into()]);

    let bundle = session
        .run_research("https://new.kenyalaw.org/judgments/", ResearchMode::ListingCrawl)
        .await
        .expect("research succeeds");
    assert_eq!(bundle.summary(), "Successfully researched 4 pages in 2.00s");

    let doc = session.bundle().expect("bundle").results[0].clone();
    let mut shell = assistants::case_chat(&doc, session.last_document_id().map(str::to_string));

    let backend = DocumentChatBackend::new(Arc::clone(&api) as Arc<dyn LensApi>);
    shell
        .send_turn(&backend, "What did the court hold?")
        .await
        .expect("submission accepted");

    let calls = api.chat_calls.lock().expect("lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "doc_1762627721");

    let last = shell.turns().last().expect("terminal turn");
    assert_eq!(last.role, TurnRole::Assistant);
    assert_eq!(last.text, "The court held that the charge was defective.");
    assert_eq!(last.references.len(), 1);
    assert_eq!(last.confidence, Some(0.87));
}

#[tokio::test]
async fn document_assistant_refuses_until_an_id_is_supplied() {
    let api = Arc::new(ScriptedLens::new());
    let backend = DocumentChatBackend::new(Arc::clone(&api) as Arc<dyn LensApi>);

    let mut shell = assistants::document_assistant(None);
    assert!(shell.send_turn(&backend, "Summarize this").await.is_err());
    assert!(shell.turns().is_empty());
    assert!(api.chat_calls.lock().expect("lock").is_empty());

    shell.set_document_id("doc_1762627721");
    shell
        .send_turn(&backend, "Summarize this")
        .await
        .expect("gate open");
    assert_eq!(shell.turns().len(), 2);
    assert_eq!(api.chat_calls.lock().expect("lock").len(), 1);
}
