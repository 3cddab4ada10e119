//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Protocol-level errors.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The request line did not match any recognized command prefix.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}
