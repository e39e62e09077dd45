//! Invocation of the rsync engine.
//!
//! [`TransferInvoker`] runs the engine once with a fixed baseline option set
//! and classifies its exit status. Passing a destination performs a real
//! transfer. Omitting it performs a dry probe: the engine only lists the
//! top level of the source, which is enough to prove the upstream is
//! reachable.
//!
//! Output handling is delegated to an [`OutputStrategy`]:
//! [`CaptureOutput`] buffers combined stdout/stderr so callers can surface
//! it on failure, and [`StreamOutput`] forwards it live (and asks the
//! engine for progress and statistics).
//!
//! Exit codes 23 (partial transfer) and 24 (vanished source files) are
//! classified as [`TransferClass::PartialSuccess`]. The outcome keeps the
//! original code in [`TransferOutcome::raw_code`] while
//! [`TransferOutcome::exit_code`] reports 0.

mod output;
mod pump;

pub use output::{CaptureOutput, OutputStrategy, StreamOutput};

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use crate::exit_code::{ExitCode, HasExitCode};
use crate::trace_transfer;
use pump::{PumpError, pump_child_output};

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// Engine status for "some files/attrs were not transferred".
pub const PARTIAL_TRANSFER_CODE: i32 = 23;

/// Engine status for "some files vanished before they could be transferred".
pub const VANISHED_CODE: i32 = 24;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Options applied to every real transfer.
const BASELINE_OPTIONS: &[&str] = &[
    "--recursive",
    "--links",
    "--perms",
    "--times",
    "--hard-links",
    "--sparse",
    "--safe-links",
    "--delete-delay",
    "--delay-updates",
    "--no-motd",
];

/// Options added when output streams to the operator.
const PROGRESS_OPTIONS: &[&str] = &["--verbose", "--progress", "--stats", "--human-readable"];

/// Connection and I/O inactivity limits passed to the engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransferTimeouts {
    /// `--contimeout`
    pub connect: Duration,
    /// `--timeout`
    pub idle: Duration,
}

impl TransferTimeouts {
    /// Limits for full and partial transfers.
    pub const TRANSFER: Self = Self {
        connect: Duration::from_secs(60),
        idle: Duration::from_secs(600),
    };

    /// Limits for upstream probes.
    pub const PROBE: Self = Self {
        connect: Duration::from_secs(10),
        idle: Duration::from_secs(30),
    };

    fn arguments(self) -> [OsString; 2] {
        [
            OsString::from(format!("--contimeout={}", self.connect.as_secs())),
            OsString::from(format!("--timeout={}", self.idle.as_secs())),
        ]
    }
}

impl Default for TransferTimeouts {
    fn default() -> Self {
        Self::TRANSFER
    }
}

/// How an engine exit status is treated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferClass {
    /// Status 0.
    FullSuccess,
    /// Status 23 or 24; reported as success.
    PartialSuccess,
    /// Any other status.
    Failure,
}

impl TransferClass {
    /// Classifies a raw engine exit status.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::FullSuccess,
            PARTIAL_TRANSFER_CODE | VANISHED_CODE => Self::PartialSuccess,
            _ => Self::Failure,
        }
    }
}

/// Result of one engine invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferOutcome {
    raw_code: i32,
    class: TransferClass,
    output: Vec<u8>,
}

impl TransferOutcome {
    /// Builds an outcome from a raw status and captured output.
    #[must_use]
    pub fn new(raw_code: i32, output: Vec<u8>) -> Self {
        Self {
            raw_code,
            class: TransferClass::from_code(raw_code),
            output,
        }
    }

    /// Status exactly as the engine reported it.
    #[must_use]
    pub const fn raw_code(&self) -> i32 {
        self.raw_code
    }

    /// Status after remapping partial success to 0.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.class {
            TransferClass::FullSuccess | TransferClass::PartialSuccess => 0,
            TransferClass::Failure => self.raw_code,
        }
    }

    /// Classification of the raw status.
    #[must_use]
    pub const fn class(&self) -> TransferClass {
        self.class
    }

    /// Whether the run counts as failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.class, TransferClass::Failure)
    }

    /// Captured combined output; empty when output was streamed.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Captured output decoded lossily.
    #[must_use]
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Failure to run the engine at all.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The binary could not be launched.
    #[error("failed to launch '{}': {source}", binary.to_string_lossy())]
    Spawn {
        /// Binary that failed to start.
        binary: OsString,
        /// Underlying launch error.
        #[source]
        source: io::Error,
    },
    /// Reading engine output failed.
    #[error("failed to read transfer output: {0}")]
    Read(#[source] io::Error),
    /// Forwarding engine output to the caller failed.
    #[error("failed to forward transfer output: {0}")]
    Forward(#[source] io::Error),
    /// Waiting for the engine failed.
    #[error("failed to wait for transfer process: {0}")]
    Wait(#[source] io::Error),
}

impl HasExitCode for TransferError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Spawn { source, .. } => ExitCode::from_spawn_error(source),
            Self::Read(_) | Self::Forward(_) => ExitCode::MessageIo,
            Self::Wait(_) => ExitCode::WaitChild,
        }
    }
}

/// Runs the rsync engine with msync's baseline options.
#[derive(Clone, Debug)]
pub struct TransferInvoker {
    binary: OsString,
    scratch_dir: Option<PathBuf>,
    timeouts: TransferTimeouts,
}

impl TransferInvoker {
    /// Creates an invoker for `binary` with transfer timeouts.
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: None,
            timeouts: TransferTimeouts::TRANSFER,
        }
    }

    /// Stages in-flight files under `dir` (`--temp-dir`).
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Replaces the connection and inactivity limits.
    pub fn with_timeouts(mut self, timeouts: TransferTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Engine binary.
    #[must_use]
    pub fn binary(&self) -> &OsStr {
        &self.binary
    }

    /// Assembles the engine argument vector.
    ///
    /// A transfer gets the baseline options, the scratch `--temp-dir`, and
    /// the timeouts. A probe (no destination) gets only `--no-motd` and the
    /// timeouts so the listing stays shallow.
    #[must_use]
    pub fn arguments(
        &self,
        source: &str,
        destination: Option<&Path>,
        extra_options: &[OsString],
        progress: bool,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if destination.is_some() {
            args.extend(BASELINE_OPTIONS.iter().map(OsString::from));
            if let Some(dir) = &self.scratch_dir {
                let mut temp_dir = OsString::from("--temp-dir=");
                temp_dir.push(dir.as_os_str());
                args.push(temp_dir);
            }
            if progress {
                args.extend(PROGRESS_OPTIONS.iter().map(OsString::from));
            }
        } else {
            args.push(OsString::from("--no-motd"));
        }

        args.extend(self.timeouts.arguments());
        args.extend(extra_options.iter().cloned());
        args.push(OsString::from(source));
        if let Some(destination) = destination {
            args.push(destination.as_os_str().to_owned());
        }
        args
    }

    /// Runs the engine once and classifies its exit status.
    pub fn invoke<O>(
        &self,
        source: &str,
        destination: Option<&Path>,
        extra_options: &[OsString],
        output: &mut O,
    ) -> Result<TransferOutcome, TransferError>
    where
        O: OutputStrategy + ?Sized,
    {
        let args = self.arguments(source, destination, extra_options, output.wants_progress());
        trace_transfer!(
            binary = %self.binary.to_string_lossy(),
            source,
            probe = destination.is_none(),
            "starting engine"
        );
        trace!(target: "msync::transfer", ?args, "engine arguments");

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| TransferError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        pump_child_output(&mut child, output).map_err(|error| match error {
            PumpError::Read(error) => TransferError::Read(error),
            PumpError::Forward(error) => TransferError::Forward(error),
        })?;

        let status = child.wait().map_err(TransferError::Wait)?;
        let code = status_code(status);
        trace_transfer!(source, code, "engine finished");

        Ok(TransferOutcome::new(code, output.take_captured()))
    }
}

fn status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        if let Some(signal) = status.signal() {
            return (128 + signal).min(MAX_EXIT_CODE);
        }
    }

    MAX_EXIT_CODE
}
