//! HTTP client for the research (lens) backend.
//!
//! Two calls: a crawl request returning a [`ResearchBundle`] wholesale,
//! and a document-grounded chat exchange. Both are plain JSON POSTs;
//! the backend does the actual crawling and retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::chat::shell::{ChatBackend, ChatReply, Outbound};
use crate::config::LensConfig;
use crate::error::{ChatError, LensError};
use crate::lens::types::ResearchBundle;

/// Parameters of one crawl request, fully determined by the target URL
/// and the research mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResearchRequest {
    pub url: String,
    pub limit: u32,
    pub research_links: bool,
}

/// Reply from the document-chat endpoint. Older backend versions put
/// the text under `message`, newer ones under `response`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentChatReply {
    pub response: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub document_references: Vec<String>,
    pub confidence: Option<f32>,
}

impl DocumentChatReply {
    pub fn text(&self) -> &str {
        self.response
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.message.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct DocumentChatRequest<'a> {
    message: &'a str,
    document_id: &'a str,
    context: &'a str,
}

/// The research collaborator boundary. Production uses
/// [`HttpLensClient`]; tests substitute scripted implementations.
#[async_trait]
pub trait LensApi: Send + Sync {
    async fn research(&self, request: ResearchRequest) -> Result<ResearchBundle, LensError>;

    async fn chat_with_document(
        &self,
        message: &str,
        document_id: &str,
        context: &str,
        token: CancelToken,
    ) -> Result<DocumentChatReply, ChatError>;
}

pub struct HttpLensClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLensClient {
    pub fn new(config: &LensConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl LensApi for HttpLensClient {
    async fn research(&self, request: ResearchRequest) -> Result<ResearchBundle, LensError> {
        tracing::info!(url = %request.url, limit = request.limit, follow = request.research_links, "research request");
        let response = self
            .http
            .post(format!("{}/research", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LensError::Endpoint {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn chat_with_document(
        &self,
        message: &str,
        document_id: &str,
        context: &str,
        mut token: CancelToken,
    ) -> Result<DocumentChatReply, ChatError> {
        let request = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&DocumentChatRequest {
                message,
                document_id,
                context,
            });

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Endpoint {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Adapts the document-chat call to the shell's [`ChatBackend`] seam.
pub struct DocumentChatBackend {
    api: Arc<dyn LensApi>,
}

impl DocumentChatBackend {
    pub fn new(api: Arc<dyn LensApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChatBackend for DocumentChatBackend {
    async fn send(&self, outbound: Outbound) -> Result<ChatReply, ChatError> {
        // The shell's gate guarantees an id; a missing one here is a
        // wiring bug, not a user error.
        let document_id = outbound.document_id.as_deref().ok_or_else(|| {
            ChatError::Transport("document chat issued without a document id".to_string())
        })?;

        let reply = self
            .api
            .chat_with_document(&outbound.prompt, document_id, &outbound.context, outbound.token)
            .await?;

        Ok(ChatReply {
            content: reply.text().to_string(),
            references: reply.document_references.clone(),
            confidence: reply.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::DocumentChatReply;

    #[test]
    fn reply_text_prefers_response_over_message() {
        let reply = DocumentChatReply {
            response: Some("from response".to_string()),
            message: Some("from message".to_string()),
            ..DocumentChatReply::default()
        };
        assert_eq!(reply.text(), "from response");

        let fallback = DocumentChatReply {
            response: Some("   ".to_string()),
            message: Some("from message".to_string()),
            ..DocumentChatReply::default()
        };
        assert_eq!(fallback.text(), "from message");

        assert_eq!(DocumentChatReply::default().text(), "");
    }
}
