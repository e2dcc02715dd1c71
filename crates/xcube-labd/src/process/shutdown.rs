//! Termination requests that end the serve loop.
//!
//! A [`ShutdownSignal`] decides both when the daemon stops accepting
//! requests and how long requests already in flight may take to finish.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that ask the daemon to stop.
const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the daemon's shutdown request.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the daemon should stop serving.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the request can no longer be observed.
    fn wait(&self) -> Result<(), ShutdownError>;

    /// Time in-flight requests get to complete once [`ShutdownSignal::wait`]
    /// has returned.
    fn drain_budget(&self) -> Duration;
}

/// Errors reported by shutdown listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering for termination signals failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Listener for the process termination signals.
///
/// Handlers are registered on construction, so a signal arriving while the
/// daemon is still binding its listener is queued rather than lost.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
    drain_budget: Duration,
}

impl SystemShutdownSignal {
    /// Registers for the termination signals.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when the handlers cannot be
    /// registered.
    pub fn install(drain_budget: Duration) -> Result<Self, ShutdownError> {
        let signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
            drain_budget,
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = self
            .signals
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if let Some(signal) = signals.forever().next() {
            info!(
                target: PROCESS_TARGET,
                signal,
                drain_ms = self.drain_budget.as_millis(),
                "termination signal received; draining requests"
            );
        }
        Ok(())
    }

    fn drain_budget(&self) -> Duration {
        self.drain_budget
    }
}
