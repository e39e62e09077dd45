use std::borrow::Borrow;
use std::fmt;
use std::io::{self, Write};

use msync_core::message::Message;

use crate::line_mode::LineMode;

/// Streaming sink that renders [`Message`] values into an [`std::io::Write`]
/// target.
///
/// # Examples
///
/// ```
/// use msync_core::message::Message;
/// use msync_logging::MessageSink;
///
/// let mut sink = MessageSink::new(Vec::new());
/// sink.write(Message::warning("scratch directory left in place"))?;
/// sink.write(Message::error(1, "no upstream available"))?;
///
/// let output = String::from_utf8(sink.into_inner()).unwrap();
/// assert_eq!(
///     output,
///     "msync warning: scratch directory left in place\nmsync error: no upstream available (code 1)\n"
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone)]
pub struct MessageSink<W> {
    writer: W,
    line_mode: LineMode,
}

impl<W> MessageSink<W> {
    /// Wraps `writer`, terminating each message with a newline.
    pub fn new(writer: W) -> Self {
        Self::with_line_mode(writer, LineMode::WithNewline)
    }

    /// Wraps `writer` with an explicit [`LineMode`].
    pub const fn with_line_mode(writer: W, line_mode: LineMode) -> Self {
        Self { writer, line_mode }
    }

    /// Mutably borrows the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink<W> {
    /// Writes one message using the sink's [`LineMode`].
    pub fn write<M>(&mut self, message: M) -> io::Result<()>
    where
        M: Borrow<Message>,
    {
        let message = message.borrow();
        if self.line_mode.append_newline() {
            message.render_line_to_writer(&mut self.writer)
        } else {
            write!(self.writer, "{message}")
        }
    }

    /// Copies raw bytes through, e.g. captured engine output.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W> fmt::Debug for MessageSink<W>
where
    W: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSink")
            .field("writer", &self.writer)
            .field("line_mode", &self.line_mode)
            .finish()
    }
}
