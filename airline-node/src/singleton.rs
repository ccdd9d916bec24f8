//! Guards against two processes sharing the same `--home` directory.
//! In-process there is exactly one `Node`, constructed once in `run`; across
//! processes the only shared state is the home directory's snapshot and
//! sqlite files, so the primitive that matters here is a lock file, not a
//! `sync::Once`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another airline-node already holds the lock at {0}")]
    AlreadyLocked(PathBuf),
    #[error("i/o error acquiring home lock: {0}")]
    Io(#[from] std::io::Error),
}

/// An exclusively-held `<home>/.lock` file; removed on drop so a clean
/// shutdown releases it immediately rather than waiting on process exit.
pub struct HomeLock {
    path: PathBuf,
}

impl HomeLock {
    /// Acquire the lock, failing fast if another process already holds it.
    /// Uses `create_new` so the check-and-create is atomic at the
    /// filesystem level, not a separate exists-then-create race.
    pub fn acquire(home: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = home.as_ref().join(".lock");
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(LockError::AlreadyLocked(path));
            }
            Err(err) => return Err(err.into()),
        };
        write!(file, "{}", std::process::id())?;
        Ok(Self { path })
    }
}

impl Drop for HomeLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Exposed for tests that want to check stale-lock cleanup.
#[cfg(test)]
pub fn lock_path(home: impl AsRef<Path>) -> PathBuf {
    home.as_ref().join(".lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_in_the_same_home_fails() {
        let dir = tempfile::tempdir().unwrap();
        let first = HomeLock::acquire(dir.path()).unwrap();

        let second = HomeLock::acquire(dir.path());
        assert!(matches!(second, Err(LockError::AlreadyLocked(_))));

        drop(first);
        assert!(HomeLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn dropping_the_lock_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let lock = HomeLock::acquire(dir.path()).unwrap();
        let path = lock_path(dir.path());
        assert!(path.exists());

        drop(lock);
        assert!(!path.exists());
    }
}
