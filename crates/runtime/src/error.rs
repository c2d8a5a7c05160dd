//! Error types for the stream runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting or replaying cabinet traffic.
#[derive(Debug, Error)]
pub enum Error {
    /// The WebSocket handshake with the cabinet failed. There is no retry
    /// here; callers decide whether this is fatal.
    #[error("failed to connect to cabinet: {0}")]
    ConnectionFailed(String),

    /// The established transport failed mid-stream.
    #[error("transport error: {0}")]
    TransportError(String),

    /// A live connection is already driving this stream.
    #[error("connection already established")]
    AlreadyConnected,

    /// A transcript line could not be parsed.
    #[error("transcript line {line}: {reason}")]
    Transcript { line: usize, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the connect-time failure callers usually treat as fatal.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Error::ConnectionFailed(_))
    }
}
