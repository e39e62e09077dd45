//! Immutable run configuration assembled once at startup.
//!
//! [`SyncRequest`] replaces ambient configuration: the CLI builds one value
//! through [`SyncRequestBuilder`] and every component receives it (or the
//! fields it needs) explicitly. Validation happens in
//! [`SyncRequestBuilder::build`] so an invalid request never reaches the
//! coordinator, and therefore never touches the lock or the filesystem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};
use crate::instance::InstanceId;

/// Environment variable overriding the rsync binary.
pub const RSYNC_BINARY_ENV: &str = "MSYNC_RSYNC";

/// Binary used when no override is configured.
pub const DEFAULT_RSYNC_BINARY: &str = "rsync";

/// Default scratch root for lock files and staging directories.
pub const DEFAULT_SCRATCH_ROOT: &str = "/tmp";

/// Default upper bound of the randomized start delay, in seconds.
pub const DEFAULT_RANDOM_DELAY_SECS: u64 = 300;

/// Default elapsed-time threshold before a warning is emitted, in seconds.
pub const DEFAULT_WARNING_TIMEOUT_SECS: u64 = 3600;

/// Reasons a [`SyncRequest`] is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A marker sync suffix was given without a marker URL.
    #[error("--last-update-sync requires --last-update-url")]
    MarkerSyncWithoutUrl,
    /// No source URI was supplied.
    #[error("at least one source is required")]
    MissingSources,
    /// No destination directory was supplied.
    #[error("a destination directory is required")]
    MissingDestination,
    /// A source operand could not be decoded as UTF-8.
    #[error("source {0} is not valid UTF-8")]
    NonUtf8Source(String),
    /// The scratch directory would be created inside the destination tree.
    #[error("scratch directory {} lies inside destination {}", scratch.display(), destination.display())]
    ScratchInsideDestination {
        /// Staging directory derived from the scratch root.
        scratch: PathBuf,
        /// Destination directory.
        destination: PathBuf,
    },
}

impl HasExitCode for RequestError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::Syntax
    }
}

/// Validated configuration for a single synchronization run.
#[derive(Clone, Debug)]
pub struct SyncRequest {
    sources: Vec<String>,
    destination: PathBuf,
    scratch_root: PathBuf,
    marker_url: Option<String>,
    marker_sync_path: Option<String>,
    random_delay: Duration,
    warning_timeout: Duration,
    transfer_options: Vec<OsString>,
    verbose: bool,
    skip_probe: bool,
    interactive: bool,
    instance_id: InstanceId,
    rsync_binary: OsString,
}

impl SyncRequest {
    /// Returns a builder seeded with the documented defaults.
    pub fn builder() -> SyncRequestBuilder {
        SyncRequestBuilder::default()
    }

    /// Candidate upstream URIs in priority order.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Destination directory.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Root under which the lock file and scratch directory live.
    #[must_use]
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Remote marker URL used for staleness detection.
    #[must_use]
    pub fn marker_url(&self) -> Option<&str> {
        self.marker_url.as_deref()
    }

    /// Source suffix synced when the marker reports the tree as current.
    #[must_use]
    pub fn marker_sync_path(&self) -> Option<&str> {
        self.marker_sync_path.as_deref()
    }

    /// Exclusive upper bound of the randomized start delay.
    #[must_use]
    pub const fn random_delay(&self) -> Duration {
        self.random_delay
    }

    /// Elapsed-time threshold for the slow-run warning.
    #[must_use]
    pub const fn warning_timeout(&self) -> Duration {
        self.warning_timeout
    }

    /// Options forwarded verbatim to the engine.
    #[must_use]
    pub fn transfer_options(&self) -> &[OsString] {
        &self.transfer_options
    }

    /// Whether engine output streams live instead of being captured.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether upstream probing is bypassed.
    #[must_use]
    pub const fn skip_probe(&self) -> bool {
        self.skip_probe
    }

    /// Whether the run is attached to an interactive terminal.
    #[must_use]
    pub const fn interactive(&self) -> bool {
        self.interactive
    }

    /// Identifier scoping the lock file and scratch directory.
    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    /// Engine binary to execute.
    #[must_use]
    pub fn rsync_binary(&self) -> &OsString {
        &self.rsync_binary
    }

    /// `<scratch-root>/msync-<id>.lck`
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.instance_id.lock_path(&self.scratch_root)
    }

    /// `<scratch-root>/msync-<id>/`
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.instance_id.scratch_dir(&self.scratch_root)
    }
}

/// Builder for [`SyncRequest`].
#[derive(Clone, Debug)]
pub struct SyncRequestBuilder {
    sources: Vec<String>,
    destination: Option<PathBuf>,
    scratch_root: PathBuf,
    marker_url: Option<String>,
    marker_sync_path: Option<String>,
    random_delay: Duration,
    warning_timeout: Duration,
    transfer_options: Vec<OsString>,
    verbose: bool,
    skip_probe: bool,
    interactive: bool,
    instance_id: Option<String>,
    rsync_binary: Option<OsString>,
}

impl Default for SyncRequestBuilder {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            destination: None,
            scratch_root: PathBuf::from(DEFAULT_SCRATCH_ROOT),
            marker_url: None,
            marker_sync_path: None,
            random_delay: Duration::from_secs(DEFAULT_RANDOM_DELAY_SECS),
            warning_timeout: Duration::from_secs(DEFAULT_WARNING_TIMEOUT_SECS),
            transfer_options: Vec::new(),
            verbose: false,
            skip_probe: false,
            interactive: false,
            instance_id: None,
            rsync_binary: None,
        }
    }
}

impl SyncRequestBuilder {
    /// Appends a candidate upstream URI.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Replaces the candidate list.
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the destination directory.
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Sets the scratch root.
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Sets the remote marker URL.
    pub fn marker_url(mut self, url: Option<String>) -> Self {
        self.marker_url = url;
        self
    }

    /// Sets the marker sync suffix.
    pub fn marker_sync_path(mut self, path: Option<String>) -> Self {
        self.marker_sync_path = path;
        self
    }

    /// Sets the random delay bound in seconds.
    pub fn random_delay_secs(mut self, seconds: u64) -> Self {
        self.random_delay = Duration::from_secs(seconds);
        self
    }

    /// Sets the warning timeout in seconds.
    pub fn warning_timeout_secs(mut self, seconds: u64) -> Self {
        self.warning_timeout = Duration::from_secs(seconds);
        self
    }

    /// Appends an option forwarded to the engine.
    pub fn transfer_option(mut self, option: impl Into<OsString>) -> Self {
        self.transfer_options.push(option.into());
        self
    }

    /// Streams engine output instead of capturing it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Uses the first candidate without probing.
    pub fn skip_probe(mut self, skip: bool) -> Self {
        self.skip_probe = skip;
        self
    }

    /// Marks the run as interactive, which disables the random delay.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Overrides the destination-derived instance id.
    pub fn instance_id(mut self, id: Option<String>) -> Self {
        self.instance_id = id;
        self
    }

    /// Overrides the engine binary. Takes precedence over [`RSYNC_BINARY_ENV`].
    pub fn rsync_binary(mut self, binary: impl Into<OsString>) -> Self {
        self.rsync_binary = Some(binary.into());
        self
    }

    /// Validates the configuration and produces the request.
    pub fn build(self) -> Result<SyncRequest, RequestError> {
        if self.marker_sync_path.is_some() && self.marker_url.is_none() {
            return Err(RequestError::MarkerSyncWithoutUrl);
        }
        if self.sources.is_empty() {
            return Err(RequestError::MissingSources);
        }
        let destination = self
            .destination
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(RequestError::MissingDestination)?;

        let instance_id = match self.instance_id.as_deref() {
            Some(id) => InstanceId::from_override(id),
            None => InstanceId::from_destination(&destination),
        };
        let scratch = instance_id.scratch_dir(&self.scratch_root);
        if scratch.starts_with(&destination) {
            return Err(RequestError::ScratchInsideDestination {
                scratch,
                destination,
            });
        }
        let rsync_binary = self
            .rsync_binary
            .or_else(|| std::env::var_os(RSYNC_BINARY_ENV).filter(|value| !value.is_empty()))
            .unwrap_or_else(|| OsString::from(DEFAULT_RSYNC_BINARY));

        Ok(SyncRequest {
            sources: self.sources,
            destination,
            scratch_root: self.scratch_root,
            marker_url: self.marker_url,
            marker_sync_path: self.marker_sync_path,
            random_delay: self.random_delay,
            warning_timeout: self.warning_timeout,
            transfer_options: self.transfer_options,
            verbose: self.verbose,
            skip_probe: self.skip_probe,
            interactive: self.interactive,
            instance_id,
            rsync_binary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SyncRequestBuilder {
        SyncRequest::builder()
            .source("rsync://mirror.example.org/arch/")
            .destination("/srv/mirror/arch")
            .rsync_binary("rsync")
    }

    #[test]
    fn builder_defaults() {
        let request = base().build().expect("valid request");
        assert_eq!(request.scratch_root(), Path::new(DEFAULT_SCRATCH_ROOT));
        assert_eq!(
            request.random_delay(),
            Duration::from_secs(DEFAULT_RANDOM_DELAY_SECS)
        );
        assert_eq!(
            request.warning_timeout(),
            Duration::from_secs(DEFAULT_WARNING_TIMEOUT_SECS)
        );
        assert!(!request.verbose());
        assert!(!request.skip_probe());
        assert!(request.marker_url().is_none());
        assert_eq!(request.instance_id().as_str(), "srv-mirror-arch");
    }

    #[test]
    fn marker_sync_without_url_is_rejected() {
        let error = base()
            .marker_sync_path(Some("/lastsync".to_owned()))
            .build()
            .expect_err("suffix without url must fail");
        assert_eq!(error, RequestError::MarkerSyncWithoutUrl);
        assert_eq!(error.exit_code(), ExitCode::Syntax);
    }

    #[test]
    fn marker_sync_with_url_is_accepted() {
        let request = base()
            .marker_url(Some("https://mirror.example.org/arch/lastupdate".to_owned()))
            .marker_sync_path(Some("/lastsync".to_owned()))
            .build()
            .expect("valid request");
        assert_eq!(request.marker_sync_path(), Some("/lastsync"));
    }

    #[test]
    fn missing_operands_are_rejected() {
        let no_sources = SyncRequest::builder().destination("/srv/x").build();
        assert_eq!(no_sources.unwrap_err(), RequestError::MissingSources);

        let no_destination = SyncRequest::builder().source("rsync://a/").build();
        assert_eq!(no_destination.unwrap_err(), RequestError::MissingDestination);
    }

    #[test]
    fn scratch_root_inside_destination_is_rejected() {
        let error = base()
            .scratch_root("/srv/mirror/arch/.tmp")
            .build()
            .expect_err("scratch inside destination must fail");
        assert_eq!(
            error,
            RequestError::ScratchInsideDestination {
                scratch: PathBuf::from("/srv/mirror/arch/.tmp/msync-srv-mirror-arch"),
                destination: PathBuf::from("/srv/mirror/arch"),
            }
        );
        assert_eq!(error.exit_code(), ExitCode::Syntax);

        let same = base().scratch_root("/srv/mirror/arch").build();
        assert!(matches!(
            same,
            Err(RequestError::ScratchInsideDestination { .. })
        ));
    }

    #[test]
    fn sibling_scratch_root_is_accepted() {
        let request = base()
            .scratch_root("/srv/mirror/arch-tmp")
            .build()
            .expect("sibling prefix is not nested");
        assert_eq!(
            request.scratch_dir(),
            PathBuf::from("/srv/mirror/arch-tmp/msync-srv-mirror-arch")
        );
    }

    #[test]
    fn instance_override_changes_paths() {
        let request = base()
            .scratch_root("/var/tmp")
            .instance_id(Some("nightly".to_owned()))
            .build()
            .expect("valid request");
        assert_eq!(request.lock_path(), PathBuf::from("/var/tmp/msync-nightly.lck"));
        assert_eq!(request.scratch_dir(), PathBuf::from("/var/tmp/msync-nightly"));
    }

    #[test]
    fn explicit_binary_wins() {
        let request = base().rsync_binary("/opt/rsync/bin/rsync").build().unwrap();
        assert_eq!(request.rsync_binary(), &OsString::from("/opt/rsync/bin/rsync"));
    }
}
