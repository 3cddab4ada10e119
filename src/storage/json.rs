//! Reference storage backend: a single JSON object of string values,
//! optionally gzip-compressed.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use serde_json::Value;
use tokio::sync::Mutex;

use super::errors::{StorageError, StorageResult};
use super::{Snapshot, Storage};

/// JSON-backed storage. Expects a UTF-8 JSON object at the document
/// root whose values are all strings; any other shape fails the load.
pub struct JsonStorage {
    gzipped: bool,
    live: ArcSwapOption<Snapshot>,
    load_lock: Mutex<()>,
}

impl JsonStorage {
    /// Creates an empty storage. `gzipped` controls whether `load`
    /// expects the file to be a gzip stream wrapping the JSON
    /// document, or the JSON document directly.
    pub fn new(gzipped: bool) -> Self {
        Self {
            gzipped,
            live: ArcSwapOption::from(None),
            load_lock: Mutex::new(()),
        }
    }

    fn parse_file(gzipped: bool, path: &Path) -> StorageResult<Snapshot> {
        let raw = std::fs::read(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let json_bytes = if gzipped {
            let mut decoder = GzDecoder::new(raw.as_slice());
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|source| StorageError::Gzip {
                    path: path.to_path_buf(),
                    source,
                })?;
            decoded
        } else {
            raw
        };

        let value: Value =
            serde_json::from_slice(&json_bytes).map_err(|source| StorageError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let object = value.as_object().ok_or_else(|| StorageError::UnexpectedShape {
            path: path.to_path_buf(),
        })?;

        let mut snapshot: Snapshot = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let s = value.as_str().ok_or_else(|| StorageError::UnexpectedShape {
                path: path.to_path_buf(),
            })?;
            snapshot.insert(key.as_bytes().to_vec(), Arc::new(s.as_bytes().to_vec()));
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load(&self, path: &Path) -> StorageResult<()> {
        let path: PathBuf = path.to_path_buf();
        let _guard = self.load_lock.lock().await;

        let gzipped = self.gzipped;
        let snapshot = tokio::task::spawn_blocking(move || Self::parse_file(gzipped, &path))
            .await
            .expect("parse_file task panicked")?;

        self.live.store(Some(Arc::new(snapshot)));
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<Arc<Vec<u8>>> {
        let guard = self.live.load();
        let snapshot = guard.as_ref()?;
        snapshot.get(key).cloned()
    }
}
