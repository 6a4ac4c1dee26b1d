//! Chat-completion client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` shape and nothing
//! more: one request, one response, no streaming, no retries. The
//! cancel token is raced against the request; losing the race maps to
//! `ChatError::Cancelled` so shells can render the cancellation line
//! instead of an error.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::chat::shell::{ChatBackend, ChatReply, Outbound};
use crate::config::LlmConfig;
use crate::error::ChatError;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// One completion exchange. `context` rides along as an extra
    /// system message so the endpoint sees the prior conversation
    /// without this client knowing how it was built.
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        context: Option<&str>,
        mut token: CancelToken,
    ) -> Result<String, ChatError> {
        let context_block = context
            .filter(|c| !c.trim().is_empty())
            .map(|context| format!("Conversation so far:\n{context}"));

        let mut messages = Vec::with_capacity(3);
        if let Some(system) = system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        if let Some(context_block) = &context_block {
            messages.push(WireMessage {
                role: "system",
                content: context_block,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: prompt,
        });

        let body = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

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
                message: truncate_endpoint_message(&message),
            });
        }

        let decoded: CompletionResponse = response.json().await?;
        Ok(decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn send(&self, outbound: Outbound) -> Result<ChatReply, ChatError> {
        let content = self
            .complete(
                &outbound.prompt,
                outbound.system.as_deref(),
                Some(&outbound.context),
                outbound.token,
            )
            .await?;
        Ok(ChatReply {
            content,
            references: Vec::new(),
            confidence: None,
        })
    }
}

/// Endpoint error bodies can be whole HTML pages; keep enough to
/// diagnose without flooding an error turn.
fn truncate_endpoint_message(raw: &str) -> String {
    const LIMIT: usize = 300;
    let trimmed = raw.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        let bounded: String = trimmed.chars().take(LIMIT).collect();
        format!("{bounded}…")
    }
}
