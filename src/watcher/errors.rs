//! Watcher error types.
//!
//! These are all locally recoverable: the watcher logs them and keeps
//! polling. They exist as a type mainly so the verification step has
//! a single place to express "why didn't this file verify".

use thiserror::Error;

/// Result type for a single verification attempt.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Why a candidate file failed MD5 sidecar verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The sidecar file could not be read.
    #[error("failed to read sidecar: {0}")]
    SidecarUnreadable(#[source] std::io::Error),

    /// The sidecar did not contain exactly 32 hex characters.
    #[error("sidecar is not a 32-character hex digest")]
    MalformedSidecar,

    /// The watched file could not be read to compute its digest.
    #[error("failed to read watched file: {0}")]
    FileUnreadable(#[source] std::io::Error),

    /// The computed digest did not match the sidecar.
    #[error("digest mismatch")]
    Mismatch,
}
