//! Convenience macros for component-scoped tracing.
//!
//! Each macro forwards to [`tracing::debug!`] with the target that
//! `msync_logging` maps onto the matching component level.

/// Emit a lock acquisition or release trace.
///
/// # Example
/// ```ignore
/// trace_lock!(path = %path.display(), "lock acquired");
/// ```
#[macro_export]
macro_rules! trace_lock {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "msync::lock", $($arg)*);
    };
}

/// Emit an upstream probe trace.
#[macro_export]
macro_rules! trace_probe {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "msync::probe", $($arg)*);
    };
}

/// Emit a marker comparison trace.
#[macro_export]
macro_rules! trace_marker {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "msync::marker", $($arg)*);
    };
}

/// Emit an engine invocation trace.
///
/// # Example
/// ```ignore
/// trace_transfer!(source, code, "engine finished");
/// ```
#[macro_export]
macro_rules! trace_transfer {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "msync::transfer", $($arg)*);
    };
}

/// Emit a cleanup trace.
#[macro_export]
macro_rules! trace_cleanup {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "msync::cleanup", $($arg)*);
    };
}
