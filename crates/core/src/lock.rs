//! Per-destination advisory lock.
//!
//! The lock is an exclusive `flock` held on `<scratch-root>/msync-<id>.lck`
//! for the lifetime of [`InstanceLock`]. Acquisition never blocks: a held
//! lock yields [`LockOutcome::Contended`] so a second scheduled run can exit
//! quietly. Dropping the lock removes the backing file before releasing the
//! descriptor.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};
use crate::trace_lock;

/// Attempts made when the lock file is unlinked between open and lock.
const MAX_ACQUIRE_ATTEMPTS: usize = 8;

/// Error raised when the lock file cannot be opened or locked.
#[derive(Debug, Error)]
#[error("failed to lock '{}': {source}", path.display())]
pub struct LockError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl LockError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Lock file path that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HasExitCode for LockError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::FileIo
    }
}

/// Result of a non-blocking acquisition attempt.
#[derive(Debug)]
pub enum LockOutcome {
    /// The lock is now held by this process.
    Acquired(InstanceLock),
    /// Another process holds the lock.
    Contended,
}

/// Exclusive lock on an instance lock file.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Tries to take the lock at `path`, creating the file if needed.
    pub fn try_acquire(path: &Path) -> Result<LockOutcome, LockError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| LockError::new(path, error))?;
        }

        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(path)
                .map_err(|error| LockError::new(path, error))?;

            match file.try_lock_exclusive() {
                Ok(()) => {}
                Err(error) if is_contended(&error) => {
                    trace_lock!(path = %path.display(), "lock held elsewhere");
                    return Ok(LockOutcome::Contended);
                }
                Err(error) => return Err(LockError::new(path, error)),
            }

            // A previous holder may have unlinked the path after we opened it;
            // the lock is only meaningful if the path still names our inode.
            if still_linked(&file, path) {
                trace_lock!(path = %path.display(), "lock acquired");
                return Ok(LockOutcome::Acquired(Self {
                    path: path.to_path_buf(),
                    file,
                }));
            }
        }

        Err(LockError::new(
            path,
            io::Error::other("lock file kept disappearing during acquisition"),
        ))
    }

    /// Path of the held lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
        trace_lock!(path = %self.path.display(), "lock released");
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == fs2::lock_contended_error().kind()
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn acquire(path: &Path) -> InstanceLock {
        match InstanceLock::try_acquire(path).expect("lock opens") {
            LockOutcome::Acquired(lock) => lock,
            LockOutcome::Contended => panic!("lock unexpectedly contended"),
        }
    }

    #[test]
    fn second_acquisition_is_contended() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("msync-dest.lck");

        let held = acquire(&path);
        let second = InstanceLock::try_acquire(&path).expect("lock opens");
        assert!(matches!(second, LockOutcome::Contended));
        drop(held);
    }

    #[test]
    fn contention_does_not_remove_the_holders_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("msync-dest.lck");

        let _held = acquire(&path);
        let _ = InstanceLock::try_acquire(&path).expect("lock opens");
        assert!(path.exists());
    }

    #[test]
    fn drop_removes_file_and_allows_reacquire() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("msync-dest.lck");

        let held = acquire(&path);
        assert!(path.exists());
        drop(held);
        assert!(!path.exists());

        let again = acquire(&path);
        assert_eq!(again.path(), path);
    }

    #[test]
    fn different_instances_do_not_contend() {
        let temp = tempdir().expect("tempdir");
        let _a = acquire(&temp.path().join("msync-a.lck"));
        let _b = acquire(&temp.path().join("msync-b.lck"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested/root/msync-x.lck");
        let lock = acquire(&path);
        assert!(lock.path().exists());
    }
}
