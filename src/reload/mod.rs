//! Reload coordinator: bridges the watcher's event stream to the
//! loader and storage, so that verify → stage → parse → swap → clean
//! runs as one totally-ordered pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::loader::Loader;
use crate::observability::Logger;
use crate::storage::Storage;

/// Drives the startup discovery and the ongoing reload loop.
///
/// `loader` is single-writer and owned exclusively by this coordinator
/// for the lifetime of the daemon; `storage` is shared with the server
/// for reads.
pub struct Coordinator<S: Storage> {
    loader: Loader,
    storage: Arc<S>,
    logger: Arc<Logger>,
}

impl<S: Storage> Coordinator<S> {
    pub fn new(loader: Loader, storage: Arc<S>, logger: Arc<Logger>) -> Self {
        Self {
            loader,
            storage,
            logger,
        }
    }

    /// If a snapshot already sits in a staging slot (left over from a
    /// prior run), attempt to parse and install it. A file surviving
    /// on disk is not proof it is well-formed — e.g. it may be the
    /// staged-but-unparsed remainder of a reload that failed after
    /// `drop_in` but before `storage.load` succeeded — so this runs it
    /// through the exact same parse path a fresh reload would use, and
    /// leaves storage empty (serving misses) rather than trusting it.
    pub async fn install_existing(&mut self) {
        let Some(path) = self.loader.find_any() else {
            self.logger.info("RELOAD_STARTUP_NONE_FOUND", &[]);
            return;
        };

        match self.storage.load(&path).await {
            Ok(()) => self.logger.info(
                "RELOAD_STARTUP_LOADED",
                &[("path", &path.display().to_string())],
            ),
            Err(e) => self.logger.warn(
                "RELOAD_STARTUP_LOAD_FAILED",
                &[
                    ("path", &path.display().to_string()),
                    ("error", &e.to_string()),
                ],
            ),
        }
    }

    /// Consumes verified-file events from `events` until the channel
    /// closes, driving one full reload per event.
    pub async fn run(mut self, mut events: mpsc::Receiver<PathBuf>) {
        while let Some(path) = events.recv().await {
            self.reload_one(&path).await;
        }
        self.logger.info("RELOAD_COORDINATOR_EXIT", &[]);
    }

    async fn reload_one(&mut self, path: &Path) {
        let installed = match self.loader.drop_in(path) {
            Ok(installed) => installed,
            Err(e) => {
                self.logger.error(
                    "RELOAD_DROP_IN_FAILED",
                    &[("path", &path.display().to_string()), ("error", &e.to_string())],
                );
                return;
            }
        };

        match self.storage.load(&installed).await {
            Ok(()) => {
                self.logger.info(
                    "RELOAD_LOAD_SUCCEEDED",
                    &[("path", &installed.display().to_string())],
                );
                if self.loader.cleanup() {
                    self.logger.info("RELOAD_CLEANUP_SUCCEEDED", &[]);
                }
            }
            Err(e) => {
                // Skip cleanup: cur/prev stay at the installed values so
                // the last good predecessor remains available on disk
                // for human recovery.
                self.logger.error(
                    "RELOAD_LOAD_FAILED",
                    &[
                        ("path", &installed.display().to_string()),
                        ("error", &e.to_string()),
                    ],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Severity;
    use crate::storage::JsonStorage;

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::stderr(Severity::Trace))
    }

    #[tokio::test]
    async fn install_existing_loads_preexisting_snapshot() {
        let base = tempfile::tempdir().unwrap();
        let loader = Loader::new(base.path(), "snapshot.json").unwrap();
        std::fs::write(base.path().join("data00/snapshot.json"), r#"{"hoge":"hoge!"}"#).unwrap();

        let storage = Arc::new(JsonStorage::new(false));
        let mut coordinator = Coordinator::new(loader, storage.clone(), logger());

        coordinator.install_existing().await;
        assert_eq!(storage.get(b"hoge").unwrap().as_slice(), b"hoge!");
    }

    #[tokio::test]
    async fn install_existing_leaves_storage_empty_on_parse_failure() {
        let base = tempfile::tempdir().unwrap();
        let loader = Loader::new(base.path(), "snapshot.json").unwrap();
        std::fs::write(base.path().join("data00/snapshot.json"), b"not json").unwrap();

        let storage = Arc::new(JsonStorage::new(false));
        let mut coordinator = Coordinator::new(loader, storage.clone(), logger());

        coordinator.install_existing().await;
        assert!(storage.get(b"hoge").is_none());
    }

    #[tokio::test]
    async fn reload_drives_full_pipeline_and_cleans_predecessor() {
        let base = tempfile::tempdir().unwrap();
        let loader = Loader::new(base.path(), "snapshot.json").unwrap();
        let storage = Arc::new(JsonStorage::new(false));
        let (tx, rx) = mpsc::channel(4);

        let incoming_a = base.path().join("a.json");
        std::fs::write(&incoming_a, r#"{"k":"A"}"#).unwrap();
        let incoming_b = base.path().join("b.json");
        std::fs::write(&incoming_b, r#"{"k":"B"}"#).unwrap();

        tx.send(incoming_a).await.unwrap();
        tx.send(incoming_b).await.unwrap();
        drop(tx);

        let coordinator = Coordinator::new(loader, storage.clone(), logger());
        coordinator.run(rx).await;

        assert_eq!(storage.get(b"k").unwrap().as_slice(), b"B");
        assert!(!base.path().join("data00/snapshot.json").exists());
        assert!(base.path().join("data01/snapshot.json").exists());
    }

    #[tokio::test]
    async fn failed_load_skips_cleanup_and_keeps_predecessor() {
        let base = tempfile::tempdir().unwrap();
        let loader = Loader::new(base.path(), "snapshot.json").unwrap();
        let storage = Arc::new(JsonStorage::new(false));
        let (tx, rx) = mpsc::channel(4);

        let good = base.path().join("good.json");
        std::fs::write(&good, r#"{"k":"A"}"#).unwrap();
        let bad = base.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();

        tx.send(good).await.unwrap();
        tx.send(bad).await.unwrap();
        drop(tx);

        let coordinator = Coordinator::new(loader, storage.clone(), logger());
        coordinator.run(rx).await;

        // Still serving the good dataset.
        assert_eq!(storage.get(b"k").unwrap().as_slice(), b"A");
        // The staged-but-broken file and the last-good predecessor both
        // remain on disk because cleanup was skipped.
        assert!(base.path().join("data00/snapshot.json").exists());
        assert!(base.path().join("data01/snapshot.json").exists());
    }
}
