//! Reader threads that move child stdout/stderr into an [`OutputStrategy`].

use std::io::{self, Read};
use std::process::Child;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use super::output::OutputStrategy;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamKind {
    Stdout,
    Stderr,
}

enum StreamMessage {
    Data(StreamKind, Vec<u8>),
    Error(StreamKind, io::Error),
    Finished(StreamKind),
}

/// Failure while draining child output.
#[derive(Debug)]
pub(super) enum PumpError {
    /// Reading from the child failed.
    Read(io::Error),
    /// The strategy rejected a chunk.
    Forward(io::Error),
}

/// Drains both pipes of `child` into `output` until they close.
///
/// On failure the child is killed and reaped before returning so no
/// orphaned engine keeps writing into the scratch directory.
pub(super) fn pump_child_output<O>(child: &mut Child, output: &mut O) -> Result<(), PumpError>
where
    O: OutputStrategy + ?Sized,
{
    let (sender, receiver) = mpsc::channel();
    let mut stdout_thread = child
        .stdout
        .take()
        .map(|handle| spawn_reader(handle, StreamKind::Stdout, sender.clone()));
    let mut stderr_thread = child
        .stderr
        .take()
        .map(|handle| spawn_reader(handle, StreamKind::Stderr, sender.clone()));
    drop(sender);

    let mut stdout_open = stdout_thread.is_some();
    let mut stderr_open = stderr_thread.is_some();

    while stdout_open || stderr_open {
        let failure = match receiver.recv() {
            Ok(StreamMessage::Data(StreamKind::Stdout, data)) => {
                output.stdout(&data).err().map(PumpError::Forward)
            }
            Ok(StreamMessage::Data(StreamKind::Stderr, data)) => {
                output.stderr(&data).err().map(PumpError::Forward)
            }
            Ok(StreamMessage::Error(_, error)) => Some(PumpError::Read(error)),
            Ok(StreamMessage::Finished(StreamKind::Stdout)) => {
                stdout_open = false;
                None
            }
            Ok(StreamMessage::Finished(StreamKind::Stderr)) => {
                stderr_open = false;
                None
            }
            Err(_) => break,
        };

        if let Some(error) = failure {
            terminate(child, &mut stdout_thread, &mut stderr_thread);
            return Err(error);
        }
    }

    join(&mut stdout_thread);
    join(&mut stderr_thread);
    Ok(())
}

fn spawn_reader<R>(mut reader: R, kind: StreamKind, sender: Sender<StreamMessage>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => {
                    let _ = sender.send(StreamMessage::Finished(kind));
                    break;
                }
                Ok(read) => {
                    if sender
                        .send(StreamMessage::Data(kind, buffer[..read].to_vec()))
                        .is_err()
                    {
                        break;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    let _ = sender.send(StreamMessage::Error(kind, error));
                    break;
                }
            }
        }
    })
}

fn terminate(
    child: &mut Child,
    stdout_thread: &mut Option<JoinHandle<()>>,
    stderr_thread: &mut Option<JoinHandle<()>>,
) {
    let _ = child.kill();
    let _ = child.wait();
    join(stdout_thread);
    join(stderr_thread);
}

fn join(handle: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = handle.take() {
        let _ = handle.join();
    }
}
