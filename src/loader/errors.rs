//! Loader error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while staging snapshots on disk.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The base directory does not exist, or is not a directory.
    #[error("base directory '{0}' does not exist or is not a directory")]
    InvalidBaseDir(PathBuf),

    /// A slot subdirectory could not be created.
    #[error("failed to create slot directory '{path}': {source}")]
    CreateSlotDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving a candidate file into its next slot failed.
    #[error("failed to move '{src}' into '{dst}': {source}")]
    Rename {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
