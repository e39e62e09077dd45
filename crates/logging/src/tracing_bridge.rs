//! Bridge between the tracing crate and msync's diagnostic lines.
//!
//! [`MsyncLayer`] is a tracing-subscriber layer that gates events through a
//! [`VerbosityConfig`] and renders the survivors as
//! `msync <severity>: <message> key=value ...` lines, matching the layout
//! of [`Message`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use msync_logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(1));
//! tracing::info!(target: "msync::probe", upstream = "rsync://a/", "selected upstream");
//! ```

use std::fmt::{self, Write as _};
use std::io;

use msync_core::message::{Message, Severity};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Registry};

use super::config::VerbosityConfig;

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV: &str = "MSYNC_LOG";

/// A tracing layer that renders accepted events as msync diagnostics.
pub struct MsyncLayer<W = fn() -> io::Stderr> {
    config: VerbosityConfig,
    make_writer: W,
}

impl MsyncLayer {
    /// Creates a layer writing to stderr.
    #[must_use]
    pub fn new(config: VerbosityConfig) -> Self {
        Self {
            config,
            make_writer: io::stderr,
        }
    }
}

impl<W> MsyncLayer<W> {
    /// Replaces the output destination.
    pub fn with_writer<W2>(self, make_writer: W2) -> MsyncLayer<W2>
    where
        W2: for<'w> MakeWriter<'w> + 'static,
    {
        MsyncLayer {
            config: self.config,
            make_writer,
        }
    }

    /// Verbosity gate consulted for every event.
    pub const fn config(&self) -> &VerbosityConfig {
        &self.config
    }

    const fn severity(level: &Level) -> Severity {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl<S, W> Layer<S> for MsyncLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.config.enabled(metadata.target(), *metadata.level())
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.config.enabled(metadata.target(), *metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = Message::new(Self::severity(metadata.level()), visitor.finish());

        let mut writer = self.make_writer.make_writer();
        let _ = message.render_line_to_writer(&mut writer);
    }
}

/// Collects the `message` field followed by the remaining fields.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

/// Reads `EnvFilter` directives from [`LOG_ENV`], if set and valid.
#[must_use]
pub fn env_filter() -> Option<EnvFilter> {
    EnvFilter::try_from_env(LOG_ENV).ok()
}

/// Installs [`MsyncLayer`] as the global subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(config: VerbosityConfig) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(MsyncLayer::new(config))
        .try_init()
        .is_ok()
}

/// Installs [`MsyncLayer`] behind an additional filter layer.
///
/// Events must pass both `filter` and the verbosity gate.
///
/// # Example
///
/// ```rust,ignore
/// use msync_logging::{VerbosityConfig, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// init_tracing_with_filter(VerbosityConfig::default(), EnvFilter::new("msync::probe=debug"));
/// ```
pub fn init_tracing_with_filter<F>(config: VerbosityConfig, filter: F) -> bool
where
    F: Layer<Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(MsyncLayer::new(config))
        .try_init()
        .is_ok()
}
