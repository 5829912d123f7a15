//! Single-instance process lock.

use crate::error::{DdnsError, Result};
use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

/// Exclusive lock on a file, held until dropped.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// `<temp dir>/cloudfloat.lock`.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(concat!(env!("CARGO_PKG_NAME"), ".lock"))
    }

    /// Take the lock without blocking. Fails if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| {
                DdnsError::Lock(format!("failed to open {}: {}", path.display(), e))
            })?;

        match file.try_lock() {
            Ok(()) => Ok(Self {
                file,
                path: path.to_path_buf(),
            }),
            Err(TryLockError::WouldBlock) => Err(DdnsError::Lock(format!(
                "another instance of {} already running",
                env!("CARGO_PKG_NAME")
            ))),
            Err(TryLockError::Error(e)) => Err(DdnsError::Lock(format!(
                "failed to acquire lock on {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::error!("failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
