//! Exit codes reported by `msync` and by the rsync engine it drives.
//!
//! `msync` reports its own failures with a small subset of upstream rsync's
//! `errcode.h` values so that schedulers watching a mirror job see the same
//! numbers whether the failure came from the wrapper or from the engine.
//! Engine codes outside this subset are passed through untouched; use
//! [`engine_code_description`] to label them in diagnostics.
//!
//! # Examples
//!
//! ```
//! use msync_core::exit_code::{ExitCode, engine_code_description};
//!
//! assert_eq!(ExitCode::Syntax.as_i32(), 1);
//! assert_eq!(engine_code_description(23), "partial transfer");
//! ```

use std::fmt;

/// Exit statuses produced by `msync` itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion, including "already running" and remapped
    /// partial transfers.
    Ok = 0,

    /// Usage or validation error, or no reachable upstream (RERR_SYNTAX = 1).
    Syntax = 1,

    /// Local filesystem preparation failed (RERR_FILEIO = 11).
    FileIo = 11,

    /// Forwarding engine output to the caller failed (RERR_MESSAGEIO = 13).
    MessageIo = 13,

    /// Waiting for the engine process failed (RERR_WAITCHILD = 21).
    WaitChild = 21,

    /// The engine binary exists but could not be executed (RERR_CMD_RUN = 126).
    CommandRun = 126,

    /// The engine binary was not found (RERR_CMD_NOTFOUND = 127).
    CommandNotFound = 127,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::FileIo => "error in file IO",
            Self::MessageIo => "errors with program diagnostics",
            Self::WaitChild => "waitpid() failed",
            Self::CommandRun => "transfer command could not be run",
            Self::CommandNotFound => "transfer command not found",
        }
    }

    /// Selects the launch-failure code for an error returned by `spawn`.
    #[must_use]
    pub fn from_spawn_error(error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::CommandNotFound
        } else {
            Self::CommandRun
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        let value = code.as_i32().clamp(0, 255) as u8;
        Self::from(value)
    }
}

/// Labels an exit status reported by the rsync engine.
///
/// The strings match upstream rsync's `log.c` so that `msync` diagnostics
/// read the same as the engine's own.
#[must_use]
pub fn engine_code_description(code: i32) -> &'static str {
    match code {
        0 => "success",
        1 => "syntax or usage error",
        2 => "protocol incompatibility",
        3 => "errors selecting input/output files, dirs",
        4 => "requested action not supported",
        5 => "error starting client-server protocol",
        10 => "error in socket IO",
        11 => "error in file IO",
        12 => "error in rsync protocol data stream",
        13 => "errors with program diagnostics",
        14 => "error in IPC code",
        20 => "received SIGINT, SIGTERM, or SIGHUP",
        21 => "waitpid() failed",
        22 => "error allocating core memory buffers",
        23 => "partial transfer",
        24 => "some files vanished before they could be transferred",
        25 => "max delete limit stopped deletions",
        30 => "timeout in data send/receive",
        35 => "timeout waiting for daemon connection",
        _ => "unexplained error",
    }
}

/// Trait for types that have an associated exit code.
///
/// Error types across the workspace implement this so the CLI can turn any
/// failure into a process status without matching on concrete variants.
pub trait HasExitCode {
    /// Returns the exit code associated with this value.
    fn exit_code(&self) -> ExitCode;
}
