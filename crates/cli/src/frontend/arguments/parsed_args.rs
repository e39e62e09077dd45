use std::ffi::OsString;
use std::path::PathBuf;

/// Parsed command-line arguments for the msync front-end.
///
/// Fields are `pub` so integration tests can inspect them through
/// `msync_cli::test_utils`.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedArgs {
    /// `--help`, `-h`
    pub show_help: bool,

    /// `--version`, `-V`
    pub show_version: bool,

    /// Number of `-v`/`--verbose` occurrences.
    ///
    /// One forces live engine output; two or more also raise the log level.
    pub verbose: u8,

    /// `--quiet`, `-q`: capture engine output and log errors only.
    pub quiet: bool,

    /// `--skip-connection-check`: use the first source without probing.
    pub skip_connection_check: bool,

    /// `--dry-run`, `-n`: forwarded to the engine.
    pub dry_run: bool,

    /// `--last-update-url`
    pub last_update_url: Option<String>,

    /// `--last-update-sync`; requires `--last-update-url`.
    pub last_update_sync: Option<String>,

    /// `--random-delay` in seconds.
    pub random_delay: u64,

    /// `--temporary-directory`
    pub temporary_directory: PathBuf,

    /// `--warning-timeout` in seconds.
    pub warning_timeout: u64,

    /// Repeated `--rsync-option` values, in order.
    pub rsync_options: Vec<OsString>,

    /// `--id`
    pub id: Option<String>,

    /// Positional operands: sources followed by the destination.
    pub operands: Vec<OsString>,
}
