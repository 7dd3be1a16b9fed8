//! Chat message types

use super::{ScoreSet, ToolCall};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the input control
    User,
    /// The remote chat service
    Assistant,
    /// Client-generated notices, e.g. request failures
    System,
}

impl Role {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a chat session.
///
/// Messages are immutable once appended to a session; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique ID within the session
    pub id: Uuid,

    /// Author
    pub role: Role,

    /// Text shown in the bubble
    pub content: String,

    /// Reasoning trace reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Tools the service ran while answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolCall>>,

    /// Quality scores reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ScoreSet>,

    /// When the message was appended
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            thinking: None,
            tool_results: None,
            evaluation: None,
            created_at: Utc::now(),
        }
    }

    /// Message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Plain assistant message with no side channel
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Client-generated notice
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Attach a reasoning trace; blank traces are dropped
    pub fn with_thinking(mut self, thinking: Option<String>) -> Self {
        self.thinking = thinking.filter(|t| !t.trim().is_empty());
        self
    }

    /// Attach tool calls; an empty list is stored as absent
    pub fn with_tool_results(mut self, tools: Vec<ToolCall>) -> Self {
        self.tool_results = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    /// Attach evaluation scores
    pub fn with_evaluation(mut self, evaluation: Option<ScoreSet>) -> Self {
        self.evaluation = evaluation.filter(|e| !e.is_empty());
        self
    }

    /// Whether the message carries a reasoning trace
    pub fn has_thinking(&self) -> bool {
        self.thinking.is_some()
    }

    /// Whether the message carries at least one tool call
    pub fn has_tool_results(&self) -> bool {
        self.tool_results.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Prior turn sent to the service as conversational context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author of the turn
    pub role: Role,

    /// Turn text
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
