//! Argument handling and dispatch for the `msync` binary.
//!
//! [`run`] parses the command line, installs the tracing bridge, builds a
//! [`SyncRequest`] and hands it to the [`Coordinator`]. Every failure is
//! reported as a single `msync error: ... (code N)` line on the supplied
//! stderr writer and mapped onto the process exit status.

pub(crate) mod arguments;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use is_terminal::IsTerminal;
use msync_core::exit_code::{HasExitCode, engine_code_description};
use msync_core::message::Message;
use msync_core::msync_error;
use msync_core::error::SyncError;
use msync_core::request::{RequestError, SyncRequest};
use msync_core::{Coordinator, RunStatus};
use msync_logging::{
    MessageSink, VerbosityConfig, env_filter, init_tracing, init_tracing_with_filter,
};

use arguments::{ParsedArgs, parse_args, render_help};

/// Name used in usage text and diagnostics.
pub(crate) const PROGRAM_NAME: &str = "msync";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest status a process can report.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runs the front-end with `arguments` (program name first) and returns the
/// exit status.
///
/// `stdout` receives help, version and streamed engine output. Diagnostics
/// and captured engine output of failed transfers go to `stderr`.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let mut stderr_sink = MessageSink::new(stderr);
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, &mut stderr_sink),
        Err(error) => {
            let message = msync_error!(1, "{}", error.to_string().trim_end());
            if write_message(&message, &mut stderr_sink).is_err() {
                let _ = writeln!(stderr_sink.get_mut(), "{error}");
            }
            1
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut MessageSink<Err>) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        return match stdout.write_all(render_help().as_bytes()) {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }
    if parsed.show_version {
        return match writeln!(stdout, "{PROGRAM_NAME} {VERSION}") {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }

    install_tracing(parsed.verbose, parsed.quiet);

    let interactive = io::stdout().is_terminal();
    let stream = parsed.verbose > 0 || (!parsed.quiet && interactive);

    let status = build_request(parsed, stream, interactive)
        .and_then(|request| Coordinator::new().run(&request, stdout, stderr.get_mut()));

    match status {
        Ok(RunStatus::AlreadyRunning) => 0,
        Ok(RunStatus::Completed(outcome)) => {
            let code = outcome.exit_code();
            if outcome.is_failure() {
                let _ = stderr.write_raw(outcome.output());
                let message = msync_error!(
                    code,
                    "rsync exited with code {code}: {}",
                    engine_code_description(code)
                );
                let _ = write_message(&message, stderr);
            }
            code
        }
        Err(error) => {
            let code = error.exit_code().as_i32();
            let message = msync_error!(code, "{error}");
            let _ = write_message(&message, stderr);
            code
        }
    }
}

fn install_tracing(verbose: u8, quiet: bool) {
    let config = VerbosityConfig::from_flags(verbose, quiet);
    match env_filter() {
        Some(filter) => {
            init_tracing_with_filter(config, filter);
        }
        None => {
            init_tracing(config);
        }
    }
}

fn build_request(
    parsed: ParsedArgs,
    stream: bool,
    interactive: bool,
) -> Result<SyncRequest, SyncError> {
    let ParsedArgs {
        skip_connection_check,
        dry_run,
        last_update_url,
        last_update_sync,
        random_delay,
        temporary_directory,
        warning_timeout,
        rsync_options,
        id,
        mut operands,
        ..
    } = parsed;

    let destination = operands.pop().map(PathBuf::from);
    let sources = operands
        .into_iter()
        .map(|operand| {
            operand
                .into_string()
                .map_err(|operand| RequestError::NonUtf8Source(operand.to_string_lossy().into_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = SyncRequest::builder()
        .sources(sources)
        .scratch_root(temporary_directory)
        .marker_url(last_update_url)
        .marker_sync_path(last_update_sync)
        .random_delay_secs(random_delay)
        .warning_timeout_secs(warning_timeout)
        .verbose(stream)
        .skip_probe(skip_connection_check)
        .interactive(interactive)
        .instance_id(id);
    if let Some(destination) = destination {
        builder = builder.destination(destination);
    }
    if dry_run {
        builder = builder.transfer_option("--dry-run");
    }
    for option in rsync_options {
        builder = builder.transfer_option(option);
    }

    builder.build().map_err(SyncError::from)
}

fn write_message<W: Write>(message: &Message, sink: &mut MessageSink<W>) -> io::Result<()> {
    sink.write(message)?;
    sink.flush()
}

/// Converts a status from [`run`] into a [`std::process::ExitCode`],
/// clamping it into `0..=255`.
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    std::process::ExitCode::from(clamp_status(status))
}

fn clamp_status(status: i32) -> u8 {
    u8::try_from(status.clamp(0, MAX_EXIT_CODE)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests;
