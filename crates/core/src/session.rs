//! Scoped run state released exactly once.
//!
//! [`RunGuard`] bundles everything a run must give back: the instance lock,
//! the scratch directory and the wall-clock timer. Its `Drop` covers every
//! exit path, including early returns and unwinding panics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::lock::InstanceLock;
use crate::trace_cleanup;

/// Owns the lock and scratch directory for the duration of a run.
#[derive(Debug)]
pub struct RunGuard {
    lock: Option<InstanceLock>,
    scratch_dir: PathBuf,
    started: Instant,
    warning_timeout: Duration,
}

impl RunGuard {
    /// Starts the timer for a run holding `lock`.
    pub fn new(
        lock: InstanceLock,
        scratch_dir: impl Into<PathBuf>,
        warning_timeout: Duration,
    ) -> Self {
        Self {
            lock: Some(lock),
            scratch_dir: scratch_dir.into(),
            started: Instant::now(),
            warning_timeout,
        }
    }

    /// Pushes the slow-run threshold out by `extra`.
    pub fn extend_warning_timeout(&mut self, extra: Duration) {
        self.warning_timeout = self.warning_timeout.saturating_add(extra);
    }

    /// Current slow-run threshold.
    #[must_use]
    pub const fn warning_timeout(&self) -> Duration {
        self.warning_timeout
    }

    /// Staging directory handed to the engine.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Time since the guard was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn warn_if_slow(&self) {
        let elapsed = self.elapsed();
        if elapsed > self.warning_timeout {
            warn!(
                target: "msync::cleanup",
                elapsed_secs = elapsed.as_secs(),
                timeout_secs = self.warning_timeout.as_secs(),
                "synchronization took longer than the warning timeout"
            );
        }
    }

    fn remove_scratch_if_empty(&self) {
        match fs::remove_dir(&self.scratch_dir) {
            Ok(()) => {
                trace_cleanup!(path = %self.scratch_dir.display(), "removed scratch directory");
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                trace_cleanup!(
                    path = %self.scratch_dir.display(),
                    %error,
                    "scratch directory left in place"
                );
            }
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.warn_if_slow();
        self.remove_scratch_if_empty();
        drop(self.lock.take());
    }
}
