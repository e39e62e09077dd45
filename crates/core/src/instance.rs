//! Filesystem-safe identifiers that scope the lock file and scratch directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identifier used when the destination normalizes to nothing (e.g. `/`).
pub const FALLBACK_INSTANCE_ID: &str = "root";

/// Prefix shared by lock files and scratch directories.
pub const INSTANCE_PREFIX: &str = "msync";

/// Stable name derived from a destination path.
///
/// Separators become `-`, and empty or `.` components are dropped, which
/// trims leading/trailing separators and collapses repeated ones. Two runs
/// against the same destination always share an id. Destinations whose
/// normalized forms differ never do.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    /// Derives the identifier from a destination directory.
    #[must_use]
    pub fn from_destination(destination: &Path) -> Self {
        let parts: Vec<String> = destination
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_owned()),
                Component::Prefix(prefix) => {
                    Some(prefix.as_os_str().to_string_lossy().replace(':', ""))
                }
                Component::RootDir | Component::CurDir => None,
            })
            .collect();
        Self::from_parts(&parts)
    }

    /// Normalizes an explicit `--id` override the same way as a path.
    #[must_use]
    pub fn from_override(value: &str) -> Self {
        let parts: Vec<&str> = value
            .split(['/', '\\'])
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        Self::from_parts(&parts)
    }

    fn from_parts<S: AsRef<str>>(parts: &[S]) -> Self {
        let joined = parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("-");
        if joined.is_empty() {
            Self(FALLBACK_INSTANCE_ID.to_owned())
        } else {
            Self(joined)
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<scratch_root>/msync-<id>.lck`
    #[must_use]
    pub fn lock_path(&self, scratch_root: &Path) -> PathBuf {
        scratch_root.join(format!("{INSTANCE_PREFIX}-{}.lck", self.0))
    }

    /// `<scratch_root>/msync-<id>/`
    #[must_use]
    pub fn scratch_dir(&self, scratch_root: &Path) -> PathBuf {
        scratch_root.join(format!("{INSTANCE_PREFIX}-{}", self.0))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
