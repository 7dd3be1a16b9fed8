//! HTTP transport to the remote chat service
//!
//! One chat turn is one `POST {base_url}/chat`. The service has shipped two
//! response conventions (`message`/`thinking`/`tool_calls` and
//! `response`/`thinking_explanation`/`tool_results`); both are folded into a
//! single [`ChatReply`] here so nothing downstream branches on field names.

use crate::config::ClientConfig;
use crate::types::{HistoryEntry, ScoreSet, ToolCall};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Request body for the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Text the user submitted
    pub message: String,

    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Session token the service uses to correlate turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Normalized reply from the chat endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    /// Assistant text, absent when the service sent none
    pub content: Option<String>,

    /// Reasoning trace
    pub thinking: Option<String>,

    /// Tools the service ran
    pub tool_calls: Vec<ToolCall>,

    /// Quality scores
    pub evaluation: Option<ScoreSet>,
}

impl ChatReply {
    /// Fold a decoded response body into the canonical reply shape.
    ///
    /// Fails with a decode error when the body is not a JSON object.
    pub fn from_body(body: &Value) -> Result<Self> {
        let obj = body.as_object().ok_or_else(|| {
            ParleyError::decode(format!("expected a JSON object, got {}", kind_of(body)))
        })?;

        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| obj.get(*k).and_then(Value::as_str))
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let tool_calls = ["tool_calls", "tool_results"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .map(ToolCall::list_from_wire)
            .find(|calls| !calls.is_empty())
            .unwrap_or_default();

        Ok(Self {
            content: text(&["message", "response"]),
            thinking: text(&["thinking", "thinking_explanation"]),
            tool_calls,
            evaluation: obj.get("evaluation").and_then(ScoreSet::from_wire),
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Anything that can carry a chat turn to the service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one chat turn and wait for the reply
    async fn post(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Probe the service; `Ok(true)` means healthy
    async fn health(&self) -> Result<bool>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport for the given service
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ParleyError::config(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Chat transport using API URL: {}", config.base_url);
        Ok(Self { client, config })
    }

    /// Settings this transport was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn send_error(&self, err: reqwest::Error) -> ParleyError {
        if err.is_timeout() {
            ParleyError::network(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs_f32()
            ))
        } else {
            ParleyError::network(err.to_string())
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.config.chat_url();
        debug!(
            conversation_id = ?request.conversation_id,
            history = request.history.len(),
            "POST {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
            warn!("Chat service returned {}: {}", status.as_u16(), detail);
            return Err(ParleyError::server(status.as_u16(), detail));
        }

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ParleyError::decode(format!("response is not valid JSON: {}", e)))?;
        let reply = ChatReply::from_body(&body)?;

        debug!(
            has_text = reply.content.is_some(),
            has_thinking = reply.thinking.is_some(),
            tools = reply.tool_calls.len(),
            "Chat reply received"
        );
        Ok(reply)
    }

    async fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        debug!("Health check response: {}", response.status());
        Ok(response.status() == reqwest::StatusCode::OK)
    }
}
