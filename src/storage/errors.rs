//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while loading or reading a dataset.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The snapshot file could not be opened.
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot failed to decode as gzip.
    #[error("failed to decode gzip stream of '{path}': {source}")]
    Gzip {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot did not parse as well-formed JSON.
    #[error("failed to parse JSON in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document parsed, but not into the expected shape
    /// (a flat object of string values).
    #[error("'{path}' is not a JSON object of string values")]
    UnexpectedShape { path: PathBuf },
}
