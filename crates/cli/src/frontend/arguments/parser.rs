use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::{OsStringValueParser, PathBufValueParser};
use clap::{Arg, ArgAction, Command, value_parser};
use msync_core::request::{
    DEFAULT_RANDOM_DELAY_SECS, DEFAULT_SCRATCH_ROOT, DEFAULT_WARNING_TIMEOUT_SECS,
};

use super::ParsedArgs;
use crate::frontend::PROGRAM_NAME;

pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .about("Synchronize a local mirror from the first reachable rsync upstream.")
        .override_usage(format!("{PROGRAM_NAME} [OPTIONS] SOURCE... DEST"))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Stream transfer progress; repeat for debug logging.")
                .action(ArgAction::Count)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Capture transfer output and report errors only.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-connection-check")
                .long("skip-connection-check")
                .help("Use the first SOURCE without probing it.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .short('n')
                .help("Pass --dry-run to rsync.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("last-update-url")
                .long("last-update-url")
                .value_name("URL")
                .help("Remote marker file compared with its copy in DEST.")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("last-update-sync")
                .long("last-update-sync")
                .value_name("SUFFIX")
                .help("Source suffix synced instead of the full tree when the marker is unchanged.")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("random-delay")
                .long("random-delay")
                .value_name("SECONDS")
                .help(format!(
                    "Upper bound of the random start delay for non-interactive runs [default: {DEFAULT_RANDOM_DELAY_SECS}]."
                ))
                .value_parser(value_parser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("temporary-directory")
                .long("temporary-directory")
                .value_name("DIR")
                .help(format!(
                    "Directory holding the lock file and the staging directory [default: {DEFAULT_SCRATCH_ROOT}]."
                ))
                .value_parser(PathBufValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("warning-timeout")
                .long("warning-timeout")
                .value_name("SECONDS")
                .help(format!(
                    "Warn when a run takes longer than this [default: {DEFAULT_WARNING_TIMEOUT_SECS}]."
                ))
                .value_parser(value_parser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("rsync-option")
                .long("rsync-option")
                .value_name("OPT")
                .help("Extra option passed to rsync; may be repeated.")
                .allow_hyphen_values(true)
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .value_name("ID")
                .help("Name the lock file and staging directory instead of deriving it from DEST.")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("operands")
                .value_name("SOURCE... DEST")
                .num_args(0..)
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Append),
        )
}

/// Parses `arguments` (including the program name) into [`ParsedArgs`].
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    let remove_string = |matches: &mut clap::ArgMatches, id: &str| matches.remove_one::<String>(id);
    let last_update_url = remove_string(&mut matches, "last-update-url");
    let last_update_sync = remove_string(&mut matches, "last-update-sync");
    let id = remove_string(&mut matches, "id");

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        verbose: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
        skip_connection_check: matches.get_flag("skip-connection-check"),
        dry_run: matches.get_flag("dry-run"),
        last_update_url,
        last_update_sync,
        random_delay: matches
            .remove_one::<u64>("random-delay")
            .unwrap_or(DEFAULT_RANDOM_DELAY_SECS),
        temporary_directory: matches
            .remove_one::<PathBuf>("temporary-directory")
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_ROOT)),
        warning_timeout: matches
            .remove_one::<u64>("warning-timeout")
            .unwrap_or(DEFAULT_WARNING_TIMEOUT_SECS),
        rsync_options: matches
            .remove_many::<OsString>("rsync-option")
            .map(Iterator::collect)
            .unwrap_or_default(),
        id,
        operands: matches
            .remove_many::<OsString>("operands")
            .map(Iterator::collect)
            .unwrap_or_default(),
    })
}

/// Renders the `--help` text.
pub(crate) fn render_help() -> String {
    clap_command().render_help().to_string()
}
