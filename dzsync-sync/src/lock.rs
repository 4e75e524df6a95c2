//! Cross-process lock guarding command execution.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{io_err, SyncError};

/// Exclusive advisory lock on a file; released on drop.
#[derive(Debug)]
pub struct SyncLock {
    file: File,
    path: PathBuf,
}

impl SyncLock {
    /// Try to take the lock without blocking.
    pub fn acquire(path: &Path) -> Result<SyncLock, SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| io_err(path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired sync lock");
                Ok(SyncLock {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(SyncError::LockHeld {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(io_err(path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release sync lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run").join("dzsync.lock");

        let held = SyncLock::acquire(&path).expect("first lock");
        assert_eq!(held.path(), path.as_path());
        let err = SyncLock::acquire(&path).unwrap_err();
        assert!(matches!(err, SyncError::LockHeld { .. }), "got {err}");

        drop(held);
        SyncLock::acquire(&path).expect("lock after release");
    }
}
