//! User-visible diagnostics rendered in rsync's `<program> <severity>: <text>`
//! style.
//!
//! A [`Message`] carries a severity, an optional exit code, and the text. It
//! renders as `msync error: no reachable upstream (code 1)`, the same layout
//! upstream rsync uses for its own diagnostics, so mirror operators can grep
//! both tools' output with the same patterns.
//!
//! # Examples
//!
//! ```
//! use msync_core::{message::Message, msync_error};
//!
//! let message = msync_error!(1, "no reachable upstream");
//! assert_eq!(message.to_string(), "msync error: no reachable upstream (code 1)");
//!
//! let info = Message::info("already running");
//! assert_eq!(info.to_string(), "msync info: already running");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

/// Program label rendered at the start of every diagnostic.
pub const PROGRAM_NAME: &str = "msync";

/// Severity of a user-visible message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
}

impl Severity {
    /// Returns the lowercase label used when rendering the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured representation of an `msync` diagnostic.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[must_use = "messages must be formatted or emitted to reach users"]
pub struct Message {
    severity: Severity,
    code: Option<i32>,
    text: Cow<'static, str>,
}

impl Message {
    /// Creates a message with the provided severity and payload.
    pub fn new<T: Into<Cow<'static, str>>>(severity: Severity, text: T) -> Self {
        Self {
            severity,
            code: None,
            text: text.into(),
        }
    }

    /// Creates an informational message.
    pub fn info<T: Into<Cow<'static, str>>>(text: T) -> Self {
        Self::new(Severity::Info, text)
    }

    /// Creates a warning message.
    pub fn warning<T: Into<Cow<'static, str>>>(text: T) -> Self {
        Self::new(Severity::Warning, text)
    }

    /// Creates an error message with the provided exit code.
    pub fn error<T: Into<Cow<'static, str>>>(code: i32, text: T) -> Self {
        Self::new(Severity::Error, text).with_code(code)
    }

    /// Attaches an exit code rendered as a `(code N)` suffix.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Returns the message severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the attached exit code, if any.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// Returns the message payload.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Writes the rendered message followed by a newline.
    pub fn render_line_to_writer<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{self}")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PROGRAM_NAME} {}: {}", self.severity, self.text)?;
        if let Some(code) = self.code {
            write!(f, " (code {code})")?;
        }
        Ok(())
    }
}

/// Builds an error [`Message`] with an exit code and `format!`-style text.
#[macro_export]
macro_rules! msync_error {
    ($code:expr, $($arg:tt)+) => {
        $crate::message::Message::error($code, ::std::format!($($arg)+))
    };
}
