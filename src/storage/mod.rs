//! Pluggable read-only key-value storage.
//!
//! A `Storage` implementation owns a single atomically-swappable
//! `Snapshot` reference (built on `arc_swap::ArcSwapOption`). Readers
//! take only an atomic pointer load; writers (the reload coordinator)
//! serialize through an internal lock so at most one `load` runs at a
//! time, and a reload in progress never blocks a reader.

mod errors;
mod json;

pub use errors::{StorageError, StorageResult};
pub use json::JsonStorage;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

/// An immutable key-value mapping. Once published it is never
/// mutated; a reload replaces the whole map. Values are `Arc`-wrapped
/// so a `get` only bumps a refcount, never copies bytes.
pub type Snapshot = HashMap<Vec<u8>, Arc<Vec<u8>>>;

/// Contract implemented by every concrete storage backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Parses the dataset at `path` and, on success, atomically
    /// substitutes it for the live snapshot. On failure the live
    /// snapshot is left unchanged.
    async fn load(&self, path: &Path) -> StorageResult<()>;

    /// Looks up `key` in the live snapshot. Returns `None` if the
    /// snapshot is empty (nothing loaded yet) or the key is absent.
    fn get(&self, key: &[u8]) -> Option<Arc<Vec<u8>>>;
}
