// src/lock.rs

//! Per-partition advisory locking
//!
//! Two runs over the same (architecture, repository) partition would race on
//! the catalog rows, so each run holds an exclusive lock file next to the
//! catalog database while it reconciles the partition.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock on one partition, released on drop
#[derive(Debug)]
pub struct PartitionLock {
    file: File,
    path: PathBuf,
}

impl PartitionLock {
    /// Lock file path for a partition: `<base>.<arch>.<repo>.lock`
    pub fn path_for(base: &Path, architecture: &str, repository: &str) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(format!(
            ".{}.{}.lock",
            architecture.to_lowercase(),
            repository.to_lowercase()
        ));
        PathBuf::from(name)
    }

    /// Take the partition lock without blocking
    pub fn acquire(base: &Path, architecture: &str, repository: &str) -> Result<Self> {
        let path = Self::path_for(base, architecture, repository);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Stale lock files are left in place; unlinking one that is still
        // held would let a second run lock a fresh inode at the same path.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        if FileExt::try_lock_exclusive(&file).is_err() {
            return Err(Error::PartitionLocked(format!("{}/{}", repository, architecture)));
        }

        debug!("Acquired partition lock {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PartitionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
