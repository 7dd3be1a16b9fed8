//! Parley Core
//!
//! Client-side plumbing for talking to a remote chat/agent API:
//!
//! - Transport client that posts one chat turn and normalizes the reply
//! - Chat session controller with a single in-flight request
//! - Pure projection of a session into a view tree for front ends
//!
//! # Example
//!
//! ```no_run
//! use parley_core::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = HttpTransport::new(ClientConfig::from_env()?)?;
//!     let mut session = ChatSession::new(Arc::new(transport));
//!
//!     session.send("What is the AI MEng program?").await;
//!     let view = render_session(&session, ViewOptions::default(), &Disclosure::default());
//!     for bubble in view.bubbles() {
//!         println!("{}: {}", bubble.role, bubble.text);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use uuid::Uuid;

pub mod config;
pub mod error;
pub mod logger;
pub mod render;
pub mod session;
pub mod transport;
pub mod types;

pub use config::{load_env, ClientConfig};
pub use error::{ParleyError, Result};
pub use logger::init_logging;
pub use render::{
    render, render_session, Align, Badge, BubbleView, ChatView, Disclosure, ThinkingPanel,
    ToolRow, ToolsPanel, TypingView, ViewItem, ViewOptions, TYPING_LABEL,
};
pub use session::{
    ChatSession, SendOutcome, SessionOptions, SideChannel, NO_RESPONSE_TEXT, REQUEST_FAILED_TEXT,
};
pub use transport::{ChatReply, ChatRequest, ChatTransport, HttpTransport};
pub use types::*;
