#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Synchronization orchestration for the `msync` mirror tool.
//!
//! A run is described by an immutable [`request::SyncRequest`] and driven by
//! [`coordinator::Coordinator`]. The coordinator serializes runs per
//! destination through [`lock::InstanceLock`], picks an upstream with
//! [`probe::UpstreamProber`], asks [`marker::StalenessChecker`] whether a
//! partial sync suffices, and hands the work to
//! [`transfer::TransferInvoker`], which wraps the system rsync binary.
//!
//! Exit statuses are modelled by [`exit_code::ExitCode`]; every error type
//! implements [`exit_code::HasExitCode`] so the binary can translate
//! failures into process exit codes without matching on each variant.
//! Diagnostics shown to operators are [`message::Message`] values.

/// Per-run orchestration state machine.
pub mod coordinator;
/// Randomized start delay.
pub mod delay;
/// Top-level error type of a run.
pub mod error;
/// Exit codes and their rsync-compatible descriptions.
pub mod exit_code;
/// Destination-derived identifiers for lock and scratch paths.
pub mod instance;
/// Exclusive per-destination lock file.
pub mod lock;
/// Remote marker comparison.
pub mod marker;
/// Operator-facing diagnostic lines.
pub mod message;
/// Upstream candidate probing.
pub mod probe;
/// Validated run configuration.
pub mod request;
/// Scoped cleanup of lock, scratch directory and timer.
pub mod session;
/// rsync engine invocation and exit-status classification.
pub mod transfer;

mod tracing_macros;

pub use coordinator::{Coordinator, RunStatus};
pub use error::SyncError;
pub use exit_code::{ExitCode, HasExitCode};
pub use request::{RequestError, SyncRequest, SyncRequestBuilder};
