//! Errors that end a run before the engine reports a status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};
use crate::lock::LockError;
use crate::request::RequestError;
use crate::transfer::TransferError;

/// Fatal errors of a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request failed validation.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The lock file could not be opened or locked.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The destination or scratch directory could not be created.
    #[error("failed to create '{}': {source}", path.display())]
    Prepare {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// Every candidate failed its probe.
    #[error("no upstream available among {}", candidates.join(", "))]
    NoUpstreamAvailable {
        /// Candidates that were probed, in order.
        candidates: Vec<String>,
    },

    /// The engine could not be run to completion.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl HasExitCode for SyncError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Request(error) => error.exit_code(),
            Self::Lock(error) => error.exit_code(),
            Self::Prepare { .. } => ExitCode::FileIo,
            Self::NoUpstreamAvailable { .. } => ExitCode::Syntax,
            Self::Transfer(error) => error.exit_code(),
        }
    }
}
