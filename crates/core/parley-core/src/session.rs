//! Chat session controller
//!
//! A [`ChatSession`] owns the ordered message list of one conversation and
//! the `pending` flag that allows at most one chat request in flight. The
//! message list is append-only.
//!
//! Front ends that drive their own event loop use [`ChatSession::begin`] and
//! [`ChatSession::complete`] around the transport call; everything else can
//! call [`ChatSession::send`], which does both and settles the turn even if
//! its future is dropped mid-request.

use crate::transport::{ChatReply, ChatRequest, ChatTransport};
use crate::types::{HistoryEntry, Message, Role, ToolCall};
use crate::{ParleyError, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Assistant text used when the service replied without any
pub const NO_RESPONSE_TEXT: &str = "I'm sorry, I couldn't process that request.";

/// System text appended when a request fails
pub const REQUEST_FAILED_TEXT: &str =
    "I'm sorry, there was an error processing your request. Please try again later.";

/// Reasoning and tool activity of the most recent reply.
///
/// Cleared when a new request starts, filled when it succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideChannel {
    /// Reasoning trace
    pub thinking: Option<String>,

    /// Tools the service ran
    pub tool_calls: Vec<ToolCall>,
}

impl SideChannel {
    /// Whether there is anything to show
    pub fn is_empty(&self) -> bool {
        self.thinking.is_none() && self.tool_calls.is_empty()
    }
}

/// What a call to [`ChatSession::send`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank or a request was already in flight; nothing changed
    Ignored,
    /// The service answered and an assistant message was appended
    Answered,
    /// The request failed and a system message was appended
    Failed,
}

/// Session construction options
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Number of prior user/assistant turns sent as history
    pub history_window: usize,

    /// Assistant message shown when the session starts
    pub greeting: Option<String>,
}

/// One chat conversation
pub struct ChatSession {
    conversation_id: String,
    messages: Vec<Message>,
    pending: bool,
    side_channel: SideChannel,
    last_error: Option<String>,
    greeting_id: Option<Uuid>,
    history_window: usize,
    transport: Arc<dyn ChatTransport>,
}

impl ChatSession {
    /// Start a session with default options
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_options(transport, SessionOptions::default())
    }

    /// Start a session
    pub fn with_options(transport: Arc<dyn ChatTransport>, options: SessionOptions) -> Self {
        let conversation_id = format!("conv-{}", Uuid::new_v4());
        info!("Starting chat session {}", conversation_id);

        let mut messages = Vec::new();
        let greeting_id = options
            .greeting
            .filter(|g| !g.trim().is_empty())
            .map(|g| {
                let greeting = Message::assistant(g);
                let id = greeting.id;
                messages.push(greeting);
                id
            });

        Self {
            conversation_id,
            messages,
            pending: false,
            side_channel: SideChannel::default(),
            last_error: None,
            greeting_id,
            history_window: options.history_window,
            transport,
        }
    }

    /// Token sent with every request; fixed for the session lifetime
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recently appended message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether a request is in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Reasoning and tool activity of the latest reply
    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    /// Description of the most recent transport failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Transport this session sends through
    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    fn history(&self) -> Vec<HistoryEntry> {
        if self.history_window == 0 {
            return Vec::new();
        }
        let turns: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .filter(|m| Some(m.id) != self.greeting_id)
            .collect();
        let skip = turns.len().saturating_sub(self.history_window);
        turns.into_iter().skip(skip).map(HistoryEntry::from).collect()
    }

    /// Start a turn: append the user message and mark the session pending.
    ///
    /// # Errors
    /// Returns a validation error, and changes nothing, when `text` is blank
    /// or another request is still in flight.
    pub fn begin(&mut self, text: &str) -> Result<ChatRequest> {
        if text.trim().is_empty() {
            return Err(ParleyError::validation("message is empty"));
        }
        if self.pending {
            return Err(ParleyError::validation("a request is already in flight"));
        }

        let history = self.history();
        self.messages.push(Message::user(text));
        self.pending = true;
        self.side_channel = SideChannel::default();

        debug!(
            conversation_id = %self.conversation_id,
            "Sending message ({} chars)",
            text.len()
        );

        Ok(ChatRequest {
            message: text.to_string(),
            history,
            conversation_id: Some(self.conversation_id.clone()),
        })
    }

    /// Show a reply's reasoning and tool activity while its turn is still
    /// pending, so the in-flight indicator can display them before the
    /// assistant message lands. [`ChatSession::complete`] finishes the turn.
    ///
    /// # Errors
    /// Returns a validation error when no request is in flight.
    pub fn publish(&mut self, reply: &ChatReply) -> Result<()> {
        if !self.pending {
            return Err(ParleyError::validation("no request in flight"));
        }
        self.side_channel = SideChannel {
            thinking: reply.thinking.clone(),
            tool_calls: reply.tool_calls.clone(),
        };
        Ok(())
    }

    /// Settle the in-flight turn with the transport's result.
    ///
    /// Appends exactly one message, an assistant reply on success or a
    /// system notice on failure, and clears `pending` either way.
    ///
    /// # Errors
    /// Returns a validation error when no request is in flight.
    pub fn complete(&mut self, result: Result<ChatReply>) -> Result<&Message> {
        if !self.pending {
            return Err(ParleyError::validation("no request in flight"));
        }

        let message = match result {
            Ok(reply) => {
                self.last_error = None;
                self.side_channel = SideChannel {
                    thinking: reply.thinking.clone(),
                    tool_calls: reply.tool_calls.clone(),
                };
                let content = reply
                    .content
                    .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
                Message::assistant(content)
                    .with_thinking(reply.thinking)
                    .with_tool_results(reply.tool_calls)
                    .with_evaluation(reply.evaluation)
            }
            Err(err) => {
                if err.is_transport_failure() {
                    warn!(
                        conversation_id = %self.conversation_id,
                        "Chat request failed: {}",
                        err
                    );
                } else {
                    error!(
                        conversation_id = %self.conversation_id,
                        "Chat request could not be made: {}",
                        err
                    );
                }
                self.last_error = Some(err.to_string());
                Message::system(REQUEST_FAILED_TEXT)
            }
        };

        self.messages.push(message);
        self.pending = false;
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Send one chat turn and wait for it to settle.
    ///
    /// Blank input and input while another request is in flight are
    /// ignored. Transport failures surface as a system message; the session
    /// stays usable. If the returned future is dropped before the transport
    /// answers, the turn is settled as a failure on drop.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let request = match self.begin(text) {
            Ok(request) => request,
            Err(err) => {
                debug!("Ignoring send: {}", err);
                return SendOutcome::Ignored;
            }
        };

        let transport = Arc::clone(&self.transport);
        let turn = InFlightTurn {
            session: self,
            settled: false,
        };
        let result = transport.post(&request).await;
        turn.settle(result)
    }
}

/// Holds a session while its request is outstanding so the turn is settled
/// no matter how the request future ends.
struct InFlightTurn<'a> {
    session: &'a mut ChatSession,
    settled: bool,
}

impl InFlightTurn<'_> {
    fn settle(mut self, result: Result<ChatReply>) -> SendOutcome {
        let outcome = if result.is_ok() {
            SendOutcome::Answered
        } else {
            SendOutcome::Failed
        };
        let _ = self.session.complete(result);
        self.settled = true;
        outcome
    }
}

impl Drop for InFlightTurn<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self
                .session
                .complete(Err(ParleyError::cancelled("request dropped before it settled")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockChatTransport;
    use crate::types::ScoreSet;
    use async_trait::async_trait;
    use std::time::Duration;

    fn session_with(mock: MockChatTransport) -> ChatSession {
        ChatSession::new(Arc::new(mock))
    }

    struct StalledTransport;

    #[async_trait]
    impl ChatTransport for StalledTransport {
        async fn post(&self, _request: &ChatRequest) -> Result<ChatReply> {
            std::future::pending().await
        }

        async fn health(&self) -> Result<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut mock = MockChatTransport::new();
        mock.expect_post().times(0);
        let mut session = session_with(mock);

        assert_eq!(session.send("").await, SendOutcome::Ignored);
        assert_eq!(session.send("   \n\t").await, SendOutcome::Ignored);
        assert!(session.messages().is_empty());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_send_while_pending_is_noop() {
        let mut mock = MockChatTransport::new();
        mock.expect_post().times(0);
        let mut session = session_with(mock);

        session.begin("first question").unwrap();
        assert!(session.is_pending());

        assert_eq!(session.send("second question").await, SendOutcome::Ignored);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].content, "first question");
        assert!(session.is_pending());
    }

    #[tokio::test]
    async fn test_success_appends_user_then_assistant() {
        let mut mock = MockChatTransport::new();
        mock.expect_post()
            .withf(|req| req.message == "What is the AI MEng program?")
            .times(1)
            .returning(|_| {
                Ok(ChatReply {
                    content: Some("It's a one-year program.".to_string()),
                    thinking: Some("searched program pages".to_string()),
                    ..Default::default()
                })
            });
        let mut session = session_with(mock);

        let outcome = session.send("What is the AI MEng program?").await;

        assert_eq!(outcome, SendOutcome::Answered);
        assert!(!session.is_pending());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is the AI MEng program?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "It's a one-year program.");
        assert_eq!(
            messages[1].thinking.as_deref(),
            Some("searched program pages")
        );
    }

    #[tokio::test]
    async fn test_failure_appends_system_message() {
        let mut mock = MockChatTransport::new();
        mock.expect_post()
            .times(1)
            .returning(|_| Err(ParleyError::network("connection refused")));
        let mut session = session_with(mock);

        let outcome = session.send("hello").await;

        assert_eq!(outcome, SendOutcome::Failed);
        assert!(!session.is_pending());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::System);
        assert_eq!(messages[1].content, REQUEST_FAILED_TEXT);
        assert!(session.last_error().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_session_usable_after_failure() {
        let mut mock = MockChatTransport::new();
        let mut calls = 0;
        mock.expect_post().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ParleyError::server(500, "Failed to process message"))
            } else {
                Ok(ChatReply {
                    content: Some("back online".to_string()),
                    ..Default::default()
                })
            }
        });
        let mut session = session_with(mock);

        assert_eq!(session.send("try").await, SendOutcome::Failed);
        assert_eq!(session.send("try again").await, SendOutcome::Answered);
        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.last_message().unwrap().content, "back online");
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_missing_text_uses_placeholder() {
        let mut mock = MockChatTransport::new();
        mock.expect_post()
            .returning(|_| Ok(ChatReply::default()));
        let mut session = session_with(mock);

        session.send("anything").await;

        assert_eq!(session.last_message().unwrap().content, NO_RESPONSE_TEXT);
        assert_eq!(session.last_message().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_reply_side_channel_carried_on_message() {
        let mut mock = MockChatTransport::new();
        mock.expect_post().returning(|_| {
            Ok(ChatReply {
                content: Some("done".to_string()),
                thinking: Some("planned two lookups".to_string()),
                tool_calls: vec![ToolCall::new(
                    "events",
                    Default::default(),
                    serde_json::json!({"count": 3}),
                )],
                evaluation: Some(ScoreSet::new().with("accuracy", 9.0)),
            })
        });
        let mut session = session_with(mock);

        session.send("what's on?").await;

        let reply = session.last_message().unwrap();
        assert_eq!(reply.tool_results.as_ref().unwrap()[0].name, "events");
        assert_eq!(reply.evaluation.as_ref().unwrap().get("accuracy"), Some(9.0));
        assert_eq!(
            session.side_channel().thinking.as_deref(),
            Some("planned two lookups")
        );
        assert_eq!(session.side_channel().tool_calls.len(), 1);
    }

    #[test]
    fn test_begin_clears_stale_side_channel() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        session.begin("one").unwrap();
        session
            .complete(Ok(ChatReply {
                content: Some("answer".to_string()),
                thinking: Some("trace".to_string()),
                ..Default::default()
            }))
            .unwrap();
        assert!(!session.side_channel().is_empty());

        session.begin("two").unwrap();
        assert!(session.side_channel().is_empty());
    }

    #[test]
    fn test_published_side_channel_visible_while_pending() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        session.begin("what's on this week?").unwrap();
        let reply = ChatReply {
            content: Some("Three events.".to_string()),
            thinking: Some("queried the events calendar".to_string()),
            tool_calls: vec![ToolCall::new("events", Default::default(), serde_json::json!(3))],
            evaluation: None,
        };

        session.publish(&reply).unwrap();

        assert!(session.is_pending());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(
            session.side_channel().thinking.as_deref(),
            Some("queried the events calendar")
        );

        session.complete(Ok(reply)).unwrap();
        assert!(!session.is_pending());
        assert_eq!(session.last_message().unwrap().content, "Three events.");
    }

    #[test]
    fn test_publish_without_request_rejected() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        let err = session.publish(&ChatReply::default()).unwrap_err();
        assert!(matches!(err, ParleyError::Validation(_)));
        assert!(session.side_channel().is_empty());
    }

    #[test]
    fn test_complete_without_request_rejected() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        let err = session.complete(Ok(ChatReply::default())).unwrap_err();
        assert!(matches!(err, ParleyError::Validation(_)));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_conversation_id_stable_and_sent() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        let id = session.conversation_id().to_string();
        assert!(id.starts_with("conv-"));

        let request = session.begin("hi").unwrap();
        assert_eq!(request.conversation_id.as_deref(), Some(id.as_str()));
        session.complete(Ok(ChatReply::default())).unwrap();

        let request = session.begin("again").unwrap();
        assert_eq!(request.conversation_id.as_deref(), Some(id.as_str()));
        assert_eq!(session.conversation_id(), id);
    }

    #[test]
    fn test_history_window_excludes_greeting_and_system() {
        let mut session = ChatSession::with_options(
            Arc::new(MockChatTransport::new()),
            SessionOptions {
                history_window: 2,
                greeting: Some("Hi there! Ask me anything.".to_string()),
            },
        );
        assert_eq!(session.messages().len(), 1);

        let request = session.begin("first").unwrap();
        assert!(request.history.is_empty());
        session
            .complete(Err(ParleyError::network("timed out")))
            .unwrap();

        let request = session.begin("second").unwrap();
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].content, "first");
        session
            .complete(Ok(ChatReply {
                content: Some("reply".to_string()),
                ..Default::default()
            }))
            .unwrap();

        let request = session.begin("third").unwrap();
        let contents: Vec<_> = request.history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "reply"]);
    }

    #[test]
    fn test_default_history_is_empty() {
        let mut session = ChatSession::new(Arc::new(MockChatTransport::new()));
        session.begin("one").unwrap();
        session.complete(Ok(ChatReply::default())).unwrap();
        let request = session.begin("two").unwrap();
        assert!(request.history.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_send_still_clears_pending() {
        let mut session = ChatSession::new(Arc::new(StalledTransport));

        let timed_out = tokio::time::timeout(Duration::from_millis(20), session.send("hello"))
            .await
            .is_err();

        assert!(timed_out);
        assert!(!session.is_pending());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.last_message().unwrap().role, Role::System);
        assert!(session.last_error().unwrap().contains("cancelled"));
    }
}
