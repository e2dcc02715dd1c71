//! Idempotent start/observe/stop of the single engine.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::ENGINE_TARGET;
use super::errors::EngineError;
use super::inspector::{InspectError, ProcessFacts, ProcessInspector};
use super::launcher::EngineLauncher;
use super::output::OutputCapture;
use super::record::{EngineRecord, EngineState, EngineStatus};
use crate::health::HealthReporter;
use crate::store::{JsonStore, StoreError};

/// Output capture of the engine spawned by this daemon instance.
#[derive(Debug)]
struct SpawnedEngine {
    pid: u32,
    capture: OutputCapture,
}

/// Owns the engine slot.
///
/// All operations run under one lock, so concurrent callers observe them in
/// some serial order and at most one engine is spawned at a time.
pub struct EngineManager {
    store: JsonStore<EngineRecord>,
    inspector: Arc<dyn ProcessInspector>,
    launcher: Arc<dyn EngineLauncher>,
    reporter: Arc<dyn HealthReporter>,
    spawned: Mutex<Option<SpawnedEngine>>,
}

impl EngineManager {
    /// Creates a manager over its collaborators.
    #[must_use]
    pub fn new(
        store: JsonStore<EngineRecord>,
        inspector: Arc<dyn ProcessInspector>,
        launcher: Arc<dyn EngineLauncher>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            store,
            inspector,
            launcher,
            reporter,
            spawned: Mutex::new(None),
        }
    }

    /// Describes the recorded engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotStarted`] when no engine has been recorded,
    /// or [`EngineError::Store`] when the record cannot be read.
    pub fn state(&self) -> Result<EngineState, EngineError> {
        let spawned = self.lock();
        let record = self.store.load_or_default()?;
        if record.pid.is_none() {
            return Err(EngineError::NotStarted);
        }
        Ok(self.describe(record, spawned.as_ref()))
    }

    /// Starts the engine unless the recorded one is still live.
    ///
    /// # Errors
    ///
    /// Returns a launch error when spawning fails, or a store error when the
    /// record cannot be read or written. A spawned engine whose record cannot
    /// be written is terminated again.
    pub fn start(&self) -> Result<EngineState, EngineError> {
        let mut spawned = self.lock();
        let record = self.store.load_or_default()?;
        if record.pid.is_some() {
            let current = self.describe(record, spawned.as_ref());
            if current.status.is_live() {
                self.reporter.engine_reused(&current);
                return Ok(current);
            }
            self.reporter.engine_gone(&current);
        }

        self.reporter.engine_starting();
        let launched = match self.launcher.launch() {
            Ok(launched) => launched,
            Err(error) => {
                self.reporter.engine_launch_failed(&error);
                return Err(error);
            }
        };

        let record = launched.record;
        if let Err(error) = self.store.save(&record) {
            if let Some(pid) = record.pid {
                self.terminate_quietly(pid);
            }
            let error = EngineError::from(error);
            self.reporter.engine_launch_failed(&error);
            return Err(error);
        }

        *spawned = record.pid.map(|pid| SpawnedEngine {
            pid,
            capture: launched.capture,
        });
        self.reporter.engine_started(&record);
        Ok(self.describe(record, spawned.as_ref()))
    }

    /// Terminates the recorded engine and forgets it.
    ///
    /// Termination is best effort and skipped for an engine that is already
    /// gone; the record is removed either way, even when it can no longer be
    /// parsed. The returned state is the snapshot taken before the signal
    /// was sent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotStarted`] when there is no record.
    pub fn stop(&self) -> Result<EngineState, EngineError> {
        let mut spawned = self.lock();
        let record = match self.store.load() {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => return Err(EngineError::NotStarted),
            Err(error @ StoreError::Parse { .. }) => {
                warn!(target: ENGINE_TARGET, %error, "discarding unreadable engine record");
                EngineRecord::default()
            }
            Err(error) => return Err(error.into()),
        };

        let snapshot = self.describe(record, spawned.as_ref());
        // A gone engine's PID may have been handed to an unrelated process.
        if let Some(pid) = snapshot.record.pid
            && snapshot.status != EngineStatus::Gone
        {
            self.terminate_quietly(pid);
        }

        match self.store.delete() {
            Ok(()) | Err(StoreError::NotFound { .. }) => {}
            Err(error) => return Err(error.into()),
        }
        *spawned = None;
        self.reporter.engine_stopped(&snapshot);
        Ok(snapshot)
    }

    fn describe(&self, record: EngineRecord, spawned: Option<&SpawnedEngine>) -> EngineState {
        let Some(pid) = record.pid else {
            return EngineState::gone(record);
        };
        let own = spawned.filter(|engine| engine.pid == pid);
        let exit = own.and_then(|engine| engine.capture.exit_report());

        // A reaped engine's PID may already belong to another process.
        let mut state = if exit.is_some() {
            EngineState::gone(record)
        } else {
            match self.inspector.inspect(pid) {
                Ok(facts) if own.is_none() && !runs_recorded_command(&record, &facts) => {
                    debug!(
                        target: ENGINE_TARGET,
                        pid,
                        "recorded PID now runs a different command"
                    );
                    EngineState::gone(record)
                }
                Ok(facts) => {
                    let mut state = EngineState::with_status(record, facts.status);
                    state.name = Some(facts.name);
                    state.username = facts.username;
                    state.process_cmdline = Some(facts.cmdline);
                    state
                }
                Err(InspectError::ProcessNotFound { .. }) => EngineState::gone(record),
                Err(error) => {
                    warn!(target: ENGINE_TARGET, pid, %error, "engine inspection failed");
                    EngineState::gone(record)
                }
            }
        };

        if let Some(report) = exit {
            state.stdout = Some(report.stdout);
            state.stderr = Some(report.stderr);
            state.exit_code = report.exit_code;
        }
        state
    }

    fn terminate_quietly(&self, pid: u32) {
        match self.inspector.terminate(pid) {
            Ok(()) => {}
            Err(InspectError::ProcessNotFound { .. }) => {
                warn!(target: ENGINE_TARGET, pid, "engine already gone");
            }
            Err(error) => {
                warn!(target: ENGINE_TARGET, pid, %error, "failed to terminate engine");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<SpawnedEngine>> {
        self.spawned
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Whether `facts` describe the process launched for `record`.
///
/// Interpreters and wrappers may prepend to the command line, so only the
/// recorded arguments after the program are compared, as a suffix.
fn runs_recorded_command(record: &EngineRecord, facts: &ProcessFacts) -> bool {
    let Some((_, arguments)) = record.cmdline.split_first() else {
        return true;
    };
    facts.cmdline.ends_with(arguments)
}
