//! Server error types.

use thiserror::Error;

/// Result type for server startup.
pub type ServerResult<T> = Result<T, ServerError>;

/// Fatal startup error: the process cannot continue.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding/listening on the configured address failed.
    #[error("failed to listen on '{addr}': {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
