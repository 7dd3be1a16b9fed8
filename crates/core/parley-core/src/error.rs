//! Error types for Parley core

use thiserror::Error;

/// Main error type for Parley operations
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout or connection failure talking to the chat service
    #[error("Network error: {0}")]
    Network(String),

    /// Chat service answered with a non-2xx status
    #[error("Server error: HTTP {status}: {detail}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error text reported by the service, or the status reason
        detail: String,
    },

    /// Response body could not be parsed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An in-flight request was dropped before it settled
    #[error("Request cancelled: {0}")]
    Cancelled(String),
}

/// Convenient Result type using ParleyError
pub type Result<T> = std::result::Result<T, ParleyError>;

impl ParleyError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        ParleyError::Validation(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        ParleyError::Network(msg.into())
    }

    /// Create a server error
    pub fn server(status: u16, detail: impl Into<String>) -> Self {
        ParleyError::Server {
            status,
            detail: detail.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        ParleyError::Decode(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        ParleyError::Config(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        ParleyError::Cancelled(msg.into())
    }

    /// Whether this error came out of a chat request that failed to settle normally.
    ///
    /// The session controller collapses all of these into one chat message.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ParleyError::Network(_)
                | ParleyError::Server { .. }
                | ParleyError::Decode(_)
                | ParleyError::Cancelled(_)
        )
    }
}
