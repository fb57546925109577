use std::{
    fs::{File, OpenOptions, TryLockError},
    path::{Path, PathBuf},
};

use crate::prelude::*;

/// Mutual exclusion acquired without waiting and released when the guard is dropped.
pub trait Exclusion {
    type Guard;

    /// Acquire the exclusion, or return [`None`] when it is already held.
    fn try_acquire(&self) -> Result<Option<Self::Guard>>;
}

/// Advisory exclusive lock on a well-known file.
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Holds the lock until dropped. The file itself is left in place for the next run.
pub struct LockFileGuard(File);

impl Drop for LockFileGuard {
    fn drop(&mut self) {
        if let Err(error) = self.0.unlock() {
            warn!("failed to unlock: {error:#}");
        }
    }
}

impl Exclusion for LockFile {
    type Guard = LockFileGuard;

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn try_acquire(&self) -> Result<Option<Self::Guard>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .with_context(|| format!("failed to open the lock file `{}`", self.path.display()))?;
        match file.try_lock() {
            Ok(()) => {
                debug!("acquired");
                Ok(Some(LockFileGuard(file)))
            }
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(error)) => {
                Err(error).with_context(|| format!("failed to lock `{}`", self.path.display()))
            }
        }
    }
}
