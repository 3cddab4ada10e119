//! Two-slot on-disk staging of installed snapshots.
//!
//! A `Loader` rotates a canonically-named snapshot file between two
//! sibling directories (`data00`, `data01`) under a base directory, so
//! that the previous good snapshot always survives one more install
//! before it is cleaned up.

mod errors;

pub use errors::{LoaderError, LoaderResult};

use std::path::{Path, PathBuf};

/// Number of staging slots.
const DIR_COUNT: usize = 2;

/// Permission mode for created slot directories.
#[cfg(unix)]
const DIR_PERM: u32 = 0o755;

/// Staging loader. `cur`/`prev` start at `-1` (none) until the first
/// successful discovery or install.
pub struct Loader {
    dirs: [PathBuf; DIR_COUNT],
    filename: String,
    cur: i32,
    prev: i32,
}

impl Loader {
    /// Creates a loader rooted at `basedir`, ensuring `data00..data0N-1`
    /// exist. Fails if `basedir` does not exist or is not a directory.
    pub fn new(basedir: &Path, filename: impl Into<String>) -> LoaderResult<Self> {
        let meta = std::fs::metadata(basedir)
            .map_err(|_| LoaderError::InvalidBaseDir(basedir.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(LoaderError::InvalidBaseDir(basedir.to_path_buf()));
        }

        let mut dirs: Vec<PathBuf> = Vec::with_capacity(DIR_COUNT);
        for i in 0..DIR_COUNT {
            let dir = basedir.join(format!("data{:02}", i));
            if std::fs::metadata(&dir).is_err() {
                create_slot_dir(&dir)?;
            }
            dirs.push(dir);
        }

        Ok(Self {
            dirs: dirs.try_into().expect("DIR_COUNT entries"),
            filename: filename.into(),
            cur: -1,
            prev: -1,
        })
    }

    fn slot_path(&self, index: usize) -> PathBuf {
        self.dirs[index].join(&self.filename)
    }

    fn incr(i: usize) -> usize {
        (i + 1) % DIR_COUNT
    }

    fn decr(i: usize) -> usize {
        (i + DIR_COUNT - 1) % DIR_COUNT
    }

    /// Scans slots in order for an existing snapshot file. On the
    /// first hit, sets `cur`/`prev` and returns its path. Leaves
    /// indices unchanged if no slot holds the file.
    pub fn find_any(&mut self) -> Option<PathBuf> {
        for i in 0..DIR_COUNT {
            let path = self.slot_path(i);
            if path.is_file() {
                self.cur = i as i32;
                self.prev = Self::decr(i) as i32;
                return Some(path);
            }
        }
        None
    }

    /// Renames `src` into the next slot after `cur`, advancing
    /// `prev ← cur`, `cur ← next`. Indices are unchanged on failure.
    /// Issues a best-effort fsync-equivalent durability barrier after
    /// the rename.
    pub fn drop_in(&mut self, src: &Path) -> LoaderResult<PathBuf> {
        let next = if self.cur < 0 {
            0
        } else {
            Self::incr(self.cur as usize)
        };
        let dst = self.slot_path(next);

        std::fs::rename(src, &dst).map_err(|source| LoaderError::Rename {
            src: src.to_path_buf(),
            dst: dst.clone(),
            source,
        })?;
        sync_dir_best_effort(&self.dirs[next]);

        self.prev = self.cur;
        self.cur = next as i32;
        Ok(dst)
    }

    /// Removes the file in the predecessor slot, if any. Returns
    /// `false` if there was no predecessor, or the removal failed
    /// (not retried; caller logs).
    pub fn cleanup(&self) -> bool {
        if self.prev < 0 {
            return false;
        }
        let path = self.slot_path(self.prev as usize);
        std::fs::remove_file(&path).is_ok()
    }

    /// Current slot index, or `-1` if nothing has been installed yet.
    pub fn cur(&self) -> i32 {
        self.cur
    }

    /// Predecessor slot index, or `-1` if there isn't one yet.
    pub fn prev(&self) -> i32 {
        self.prev
    }
}

#[cfg(unix)]
fn create_slot_dir(dir: &Path) -> LoaderResult<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .mode(DIR_PERM)
        .create(dir)
        .map_err(|source| LoaderError::CreateSlotDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
fn create_slot_dir(dir: &Path) -> LoaderResult<()> {
    std::fs::create_dir(dir).map_err(|source| LoaderError::CreateSlotDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Best-effort fsync of a directory, to make the preceding rename
/// durable. Not retried and not fatal on failure: the rename itself
/// already succeeded.
#[cfg(unix)]
fn sync_dir_best_effort(dir: &Path) {
    if let Ok(f) = std::fs::File::open(dir) {
        let _ = f.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir_best_effort(_dir: &Path) {}
