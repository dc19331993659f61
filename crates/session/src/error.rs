//! Session error types.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by remote catalog operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session disconnected: {0}")]
    Disconnected(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether the failure was caused by losing the connection.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Disconnected(_))
    }
}

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
