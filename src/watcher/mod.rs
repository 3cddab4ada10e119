//! MD5-sidecar filesystem watcher.
//!
//! Periodically inspects a watched file `W`. When `W` and its `W.md5`
//! sidecar both exist and the sidecar's digest matches `W`'s actual
//! content, and that digest differs from the last one applied, the
//! watcher emits `W`'s path on its event channel and deletes the
//! sidecar as a consumed-marker.

mod errors;

pub use errors::{VerifyError, VerifyResult};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use md5::{Digest, Md5};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::observability::Logger;

/// All-zero digest, the watcher's initial "nothing applied yet" state.
const ZERO_DIGEST: [u8; 16] = [0u8; 16];

/// Verifies `file` against its `file.md5` sidecar, returning the
/// file's digest on success.
fn verify_file_md5(file: &Path, sidecar: &Path) -> VerifyResult<[u8; 16]> {
    let sidecar_contents = std::fs::read_to_string(sidecar).map_err(VerifyError::SidecarUnreadable)?;
    let hex = sidecar_contents.trim();
    if hex.len() != 32 || !hex.as_bytes().iter().all(u8::is_ascii_hexdigit) {
        return Err(VerifyError::MalformedSidecar);
    }

    let mut expected = [0u8; 16];
    for i in 0..16 {
        expected[i] =
            u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| VerifyError::MalformedSidecar)?;
    }

    let contents = std::fs::read(file).map_err(VerifyError::FileUnreadable)?;
    let mut hasher = Md5::new();
    hasher.update(&contents);
    let actual: [u8; 16] = hasher.finalize().into();

    if actual != expected {
        return Err(VerifyError::Mismatch);
    }
    Ok(actual)
}

/// Runs the watcher loop until `cancel` fires, sending verified paths
/// on the returned receiver. The sender half closes (and the receiver
/// starts returning `None`) within one poll period after cancellation.
pub fn start(
    watched: PathBuf,
    poll_interval: Duration,
    logger: Arc<Logger>,
    cancel: CancellationToken,
) -> mpsc::Receiver<PathBuf> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(run(watched, poll_interval, logger, cancel, tx));
    rx
}

async fn run(
    watched: PathBuf,
    poll_interval: Duration,
    logger: Arc<Logger>,
    cancel: CancellationToken,
    tx: mpsc::Sender<PathBuf>,
) {
    let mut applied: [u8; 16] = ZERO_DIGEST;
    let sidecar = sidecar_path(&watched);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }

        if !watched.is_file() || !sidecar.is_file() {
            continue;
        }

        match verify_file_md5(&watched, &sidecar) {
            Ok(digest) => {
                if digest == applied {
                    continue;
                }
                if tx.send(watched.clone()).await.is_err() {
                    return;
                }
                if let Err(e) = std::fs::remove_file(&sidecar) {
                    logger.warn(
                        "WATCHER_SIDECAR_REMOVE_FAILED",
                        &[("path", &sidecar.display().to_string()), ("error", &e.to_string())],
                    );
                }
                applied = digest;
            }
            Err(e) => {
                logger.warn(
                    "WATCHER_VERIFY_FAILED",
                    &[("path", &watched.display().to_string()), ("error", &e.to_string())],
                );
            }
        }
    }
}

fn sidecar_path(watched: &Path) -> PathBuf {
    let mut name = watched.as_os_str().to_owned();
    name.push(".md5");
    PathBuf::from(name)
}
