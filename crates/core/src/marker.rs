//! Staleness detection through a remote marker file.
//!
//! A mirror publishes a small marker (usually a timestamp) that changes
//! whenever the tree changes. When the remote marker matches the copy under
//! the destination, only the configured suffix needs syncing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::trace_marker;

/// Upper bound on a single marker fetch.
pub const MARKER_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves marker content. Failures yield empty content.
pub trait MarkerFetcher {
    /// Fetches the body at `url`.
    fn fetch(&self, url: &str) -> Vec<u8>;
}

/// Fetches markers over HTTP(S) or from `file://` URLs.
#[derive(Clone, Copy, Debug)]
pub struct HttpMarkerFetcher {
    timeout: Duration,
}

impl HttpMarkerFetcher {
    /// Creates a fetcher with [`MARKER_FETCH_TIMEOUT`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: MARKER_FETCH_TIMEOUT,
        }
    }

    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(url.as_str()).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

impl Default for HttpMarkerFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerFetcher for HttpMarkerFetcher {
    fn fetch(&self, url: &str) -> Vec<u8> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(target: "msync::marker", url, %error, "invalid marker url");
                return Vec::new();
            }
        };

        let fetched = if parsed.scheme() == "file" {
            parsed
                .to_file_path()
                .map_err(|()| "not a local path".to_owned())
                .and_then(|path| fs::read(path).map_err(|error| error.to_string()))
        } else {
            self.fetch_http(&parsed).map_err(|error| error.to_string())
        };

        fetched.unwrap_or_else(|error| {
            warn!(target: "msync::marker", url, %error, "marker fetch failed");
            Vec::new()
        })
    }
}

/// Decides between a partial and a full sync.
#[derive(Clone, Debug, Default)]
pub struct StalenessChecker<F = HttpMarkerFetcher> {
    fetcher: F,
}

impl StalenessChecker<HttpMarkerFetcher> {
    /// Creates a checker that fetches markers over the network.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fetcher: HttpMarkerFetcher::new(),
        }
    }
}

impl<F: MarkerFetcher> StalenessChecker<F> {
    /// Uses `fetcher` to retrieve remote markers.
    pub const fn with_fetcher(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Returns true when the remote marker matches the local copy.
    ///
    /// Without a marker URL or a sync suffix there is nothing to sync
    /// partially, so the answer is false. A missing local marker, or one
    /// that cannot be read, also forces a full sync.
    pub fn should_partial_sync(
        &self,
        marker_url: Option<&str>,
        marker_sync_path: Option<&str>,
        destination: &Path,
    ) -> bool {
        let (Some(marker_url), Some(_)) = (marker_url, marker_sync_path) else {
            return false;
        };

        let Some(local) = local_marker_path(marker_url, destination) else {
            trace_marker!(url = marker_url, "marker url has no file name");
            return false;
        };

        let local_content = match fs::read(&local) {
            Ok(content) => content,
            Err(error) => {
                trace_marker!(
                    path = %local.display(),
                    %error,
                    "no local marker, full sync required"
                );
                return false;
            }
        };

        let remote_content = self.fetcher.fetch(marker_url);
        let identical = same_ignoring_whitespace(&remote_content, &local_content);
        info!(
            target: "msync::marker",
            path = %local.display(),
            identical,
            "compared marker"
        );
        identical
    }
}

/// `<destination>/<last non-empty path segment of marker_url>`.
#[must_use]
pub fn local_marker_path(marker_url: &str, destination: &Path) -> Option<PathBuf> {
    let name = match Url::parse(marker_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .map(str::to_owned),
        Err(_) => marker_url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(str::to_owned),
    }?;

    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(destination.join(name))
}

/// Byte equality after dropping every ASCII whitespace byte.
#[must_use]
pub fn same_ignoring_whitespace(left: &[u8], right: &[u8]) -> bool {
    let strip = |bytes: &[u8]| -> Vec<u8> {
        bytes
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect()
    };
    strip(left) == strip(right)
}
