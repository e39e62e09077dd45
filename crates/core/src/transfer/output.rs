use std::io::{self, Write};

/// Destination for engine output chunks as they arrive.
///
/// The invoker pumps stdout and stderr of the engine through an
/// implementation of this trait. [`CaptureOutput`] keeps everything for
/// later inspection. [`StreamOutput`] forwards to live writers.
pub trait OutputStrategy {
    /// Receives a chunk read from the engine's stdout.
    fn stdout(&mut self, data: &[u8]) -> io::Result<()>;

    /// Receives a chunk read from the engine's stderr.
    fn stderr(&mut self, data: &[u8]) -> io::Result<()>;

    /// Whether the engine should be asked for progress and statistics.
    fn wants_progress(&self) -> bool;

    /// Hands back whatever output was retained.
    fn take_captured(&mut self) -> Vec<u8>;
}

/// Buffers combined stdout/stderr in arrival order.
#[derive(Debug, Default)]
pub struct CaptureOutput {
    buffer: Vec<u8>,
}

impl CaptureOutput {
    /// Creates an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputStrategy for CaptureOutput {
    fn stdout(&mut self, data: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn stderr(&mut self, data: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn wants_progress(&self) -> bool {
        false
    }

    fn take_captured(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

/// Forwards engine output to the caller's writers without retaining it.
pub struct StreamOutput<'a, Out: ?Sized, Err: ?Sized> {
    stdout: &'a mut Out,
    stderr: &'a mut Err,
}

impl<'a, Out, Err> StreamOutput<'a, Out, Err>
where
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    /// Wraps the writers that receive live output.
    pub fn new(stdout: &'a mut Out, stderr: &'a mut Err) -> Self {
        Self { stdout, stderr }
    }
}

impl<Out, Err> OutputStrategy for StreamOutput<'_, Out, Err>
where
    Out: Write + ?Sized,
    Err: Write + ?Sized,
{
    fn stdout(&mut self, data: &[u8]) -> io::Result<()> {
        self.stdout.write_all(data)?;
        self.stdout.flush()
    }

    fn stderr(&mut self, data: &[u8]) -> io::Result<()> {
        self.stderr.write_all(data)?;
        self.stderr.flush()
    }

    fn wants_progress(&self) -> bool {
        true
    }

    fn take_captured(&mut self) -> Vec<u8> {
        Vec::new()
    }
}
