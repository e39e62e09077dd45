//! Top-level orchestration of one synchronization run.
//!
//! The run proceeds through fixed stages:
//!
//! 1. acquire the per-destination lock, or report [`RunStatus::AlreadyRunning`];
//! 2. wrap the lock in a [`RunGuard`] that owns all cleanup;
//! 3. create the destination and scratch directories;
//! 4. sleep a random delay when not interactive;
//! 5. choose an upstream through [`UpstreamProber`];
//! 6. consult the [`StalenessChecker`] for a partial sync;
//! 7. run the transfer and return its outcome.
//!
//! Request validation happens earlier, in
//! [`SyncRequestBuilder::build`](crate::request::SyncRequestBuilder::build),
//! so nothing here runs for an invalid request.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use crate::delay::apply_random_delay;
use crate::error::SyncError;
use crate::lock::{InstanceLock, LockOutcome};
use crate::marker::{HttpMarkerFetcher, MarkerFetcher, StalenessChecker};
use crate::probe::UpstreamProber;
use crate::request::SyncRequest;
use crate::session::RunGuard;
use crate::trace_transfer;
use crate::transfer::{
    CaptureOutput, StreamOutput, TransferClass, TransferInvoker, TransferOutcome,
};

/// How a run ended when it did not fail outright.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunStatus {
    /// The engine ran; the outcome may still be a failure.
    Completed(TransferOutcome),
    /// Another run holds the lock for this destination.
    AlreadyRunning,
}

impl RunStatus {
    /// Process exit status for this result.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(outcome) => outcome.exit_code(),
            Self::AlreadyRunning => 0,
        }
    }
}

/// Drives a [`SyncRequest`] to completion.
#[derive(Clone, Debug, Default)]
pub struct Coordinator<F = HttpMarkerFetcher> {
    checker: StalenessChecker<F>,
}

impl Coordinator<HttpMarkerFetcher> {
    /// Creates a coordinator that fetches markers over the network.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            checker: StalenessChecker::new(),
        }
    }
}

impl<F: MarkerFetcher> Coordinator<F> {
    /// Uses `fetcher` for remote markers.
    pub const fn with_fetcher(fetcher: F) -> Self {
        Self {
            checker: StalenessChecker::with_fetcher(fetcher),
        }
    }

    /// Executes one run.
    ///
    /// Streamed engine output goes to `stdout`/`stderr` when the request is
    /// verbose. Otherwise it is captured in the returned outcome.
    pub fn run<Out, Err>(
        &self,
        request: &SyncRequest,
        stdout: &mut Out,
        stderr: &mut Err,
    ) -> Result<RunStatus, SyncError>
    where
        Out: Write + ?Sized,
        Err: Write + ?Sized,
    {
        let lock_path = request.lock_path();
        let lock = match InstanceLock::try_acquire(&lock_path)? {
            LockOutcome::Acquired(lock) => lock,
            LockOutcome::Contended => {
                info!(
                    target: "msync::lock",
                    instance = %request.instance_id(),
                    "another synchronization is running for this destination"
                );
                return Ok(RunStatus::AlreadyRunning);
            }
        };
        let mut guard = RunGuard::new(lock, request.scratch_dir(), request.warning_timeout());

        prepare_directory(request.destination())?;
        prepare_directory(guard.scratch_dir())?;

        let delay = apply_random_delay(request.random_delay(), request.interactive());
        guard.extend_warning_timeout(delay);

        let upstream = UpstreamProber::new(request.rsync_binary())
            .skip_probe(request.skip_probe())
            .select(request.sources(), request.transfer_options())
            .ok_or_else(|| SyncError::NoUpstreamAvailable {
                candidates: request.sources().to_vec(),
            })?;

        let source = self.source_for(request, &upstream);
        let invoker =
            TransferInvoker::new(request.rsync_binary()).with_scratch_dir(guard.scratch_dir());
        info!(
            target: "msync::transfer",
            source = %source,
            destination = %request.destination().display(),
            "synchronizing"
        );

        let destination = Some(request.destination());
        let outcome = if request.verbose() {
            let mut output = StreamOutput::new(stdout, stderr);
            invoker.invoke(&source, destination, request.transfer_options(), &mut output)?
        } else {
            let mut output = CaptureOutput::new();
            invoker.invoke(&source, destination, request.transfer_options(), &mut output)?
        };

        log_outcome(&outcome);
        drop(guard);
        Ok(RunStatus::Completed(outcome))
    }

    fn source_for(&self, request: &SyncRequest, upstream: &str) -> String {
        let partial = self.checker.should_partial_sync(
            request.marker_url(),
            request.marker_sync_path(),
            request.destination(),
        );
        match request.marker_sync_path() {
            Some(suffix) if partial => {
                info!(target: "msync::marker", suffix, "marker unchanged, syncing suffix only");
                format!("{upstream}{suffix}")
            }
            _ => upstream.to_owned(),
        }
    }
}

fn prepare_directory(path: &Path) -> Result<(), SyncError> {
    fs::create_dir_all(path).map_err(|source| SyncError::Prepare {
        path: path.to_path_buf(),
        source,
    })
}

fn log_outcome(outcome: &TransferOutcome) {
    match outcome.class() {
        TransferClass::FullSuccess => {
            info!(target: "msync::transfer", "synchronization finished");
        }
        TransferClass::PartialSuccess => {
            trace_transfer!(
                code = outcome.raw_code(),
                "partial transfer treated as success"
            );
        }
        TransferClass::Failure => {
            warn!(
                target: "msync::transfer",
                code = outcome.raw_code(),
                "synchronization failed"
            );
        }
    }
}
