//! Streaming connection errors.

use thiserror::Error;

/// Errors surfaced by the live streaming client.
#[derive(Debug, Error)]
pub enum LiveError {
    /// Failed to establish the connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection establishment exceeded the bounded wait.
    #[error("Connect timed out after {0} seconds")]
    Timeout(u64),

    /// Transport-level WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Malformed inbound frame. Logged and surfaced, never fatal to the
    /// connection.
    #[error("Unparseable frame: {0}")]
    Frame(String),

    /// The server closed the connection.
    #[error("Connection closed: {reason} (code: {code})")]
    Closed { code: u16, reason: String },

    /// Operation attempted from the wrong connection state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reconnection attempts reached the configured maximum.
    #[error("Reconnect attempts exhausted after {attempts}")]
    ReconnectExhausted { attempts: u32 },
}

impl From<serde_json::Error> for LiveError {
    fn from(e: serde_json::Error) -> Self {
        LiveError::Frame(e.to_string())
    }
}
