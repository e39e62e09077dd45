#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Diagnostics plumbing for msync.
//!
//! - [`VerbosityConfig`] turns `-v`/`-q` flags into per-[`Component`]
//!   level thresholds.
//! - [`MsyncLayer`] is a tracing-subscriber layer rendering accepted events
//!   as `msync <severity>: ...` lines; [`init_tracing`] and
//!   [`init_tracing_with_filter`] install it globally.
//! - [`MessageSink`] writes [`msync_core::message::Message`] values to any
//!   writer.

mod config;
mod line_mode;
mod sink;
mod tracing_bridge;

pub use config::{Component, VerbosityConfig};
pub use line_mode::LineMode;
pub use sink::MessageSink;
pub use tracing_bridge::{LOG_ENV, MsyncLayer, env_filter, init_tracing, init_tracing_with_filter};
