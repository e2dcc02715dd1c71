//! Bounded capture of a spawned engine's output and exit status.

use std::io::Read;
use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use tracing::{debug, warn};

use super::ENGINE_TARGET;

/// Bytes retained per stream; older output is discarded.
pub(crate) const OUTPUT_TAIL_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Default)]
struct CaptureState {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
    exited: bool,
}

/// Output and exit status of an engine after it has been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// Tail of standard output.
    pub stdout: String,
    /// Tail of standard error.
    pub stderr: String,
    /// Exit code; `None` when the engine was killed by a signal.
    pub exit_code: Option<i32>,
}

/// Shared buffer fed by the drain threads of one spawned engine.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    inner: Arc<Mutex<CaptureState>>,
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl OutputCapture {
    /// Takes ownership of `child`'s pipes and reaps it in the background.
    pub(crate) fn attach(mut child: Child) -> Self {
        let capture = Self::default();
        let pid = child.id();
        let drains = [
            child
                .stdout
                .take()
                .map(|pipe| capture.drain(pipe, Stream::Stdout)),
            child
                .stderr
                .take()
                .map(|pipe| capture.drain(pipe, Stream::Stderr)),
        ];

        let waiter = capture.clone();
        thread::spawn(move || {
            let status = child.wait();
            // Output must be complete before the exit becomes visible.
            for handle in drains.into_iter().flatten() {
                if handle.join().is_err() {
                    warn!(target: ENGINE_TARGET, pid, "engine output drain panicked");
                }
            }
            let mut state = waiter.lock();
            match status {
                Ok(status) => {
                    debug!(target: ENGINE_TARGET, pid, %status, "engine exited");
                    state.exit_code = status.code();
                }
                Err(error) => {
                    warn!(target: ENGINE_TARGET, pid, %error, "failed to reap engine");
                }
            }
            state.exited = true;
        });
        capture
    }

    /// Captured output once the engine has exited, otherwise `None`.
    #[must_use]
    pub fn exit_report(&self) -> Option<ExitReport> {
        let state = self.lock();
        state.exited.then(|| ExitReport {
            stdout: String::from_utf8_lossy(&state.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&state.stderr).into_owned(),
            exit_code: state.exit_code,
        })
    }

    fn drain<R>(&self, mut pipe: R, stream: Stream) -> thread::JoinHandle<()>
    where
        R: Read + Send + 'static,
    {
        let capture = self.clone();
        thread::spawn(move || {
            let mut chunk = [0_u8; READ_CHUNK];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(read) => capture.append(stream, &chunk[..read]),
                }
            }
        })
    }

    fn append(&self, stream: Stream, bytes: &[u8]) {
        let mut state = self.lock();
        let buffer = match stream {
            Stream::Stdout => &mut state.stdout,
            Stream::Stderr => &mut state.stderr,
        };
        buffer.extend_from_slice(bytes);
        if buffer.len() > OUTPUT_TAIL_BYTES {
            let excess = buffer.len() - OUTPUT_TAIL_BYTES;
            buffer.drain(..excess);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.inner
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
