//! Test double for [`HealthReporter`] that records structured events for assertions.
//!
//! The recorder captures the lifecycle telemetry emitted during bootstrap and
//! engine supervision so behaviour tests can validate observable events.

use std::sync::Mutex;

use crate::bootstrap::BootstrapError;
use crate::engine::{EngineError, EngineRecord, EngineState};
use crate::health::HealthReporter;

use xcube_lab_config::Config;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// Engine launch initiated.
    EngineStarting,
    /// Engine launched with the recorded PID.
    EngineStarted(Option<u32>),
    /// A live engine was reused.
    EngineReused(Option<u32>),
    /// Engine launch failed with an error description.
    EngineLaunchFailed(String),
    /// Engine stopped.
    EngineStopped(Option<u32>),
    /// Recorded engine was found dead.
    EngineGone(Option<u32>),
}

impl HealthEvent {
    /// Event name as emitted by the structured reporter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::EngineStarting => "engine_starting",
            Self::EngineStarted(_) => "engine_started",
            Self::EngineReused(_) => "engine_reused",
            Self::EngineLaunchFailed(_) => "engine_launch_failed",
            Self::EngineStopped(_) => "engine_stopped",
            Self::EngineGone(_) => "engine_gone",
        }
    }
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Names of the recorded events, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(HealthEvent::name).collect()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn engine_starting(&self) {
        self.record(HealthEvent::EngineStarting);
    }

    fn engine_started(&self, record: &EngineRecord) {
        self.record(HealthEvent::EngineStarted(record.pid));
    }

    fn engine_reused(&self, state: &EngineState) {
        self.record(HealthEvent::EngineReused(state.record.pid));
    }

    fn engine_launch_failed(&self, error: &EngineError) {
        self.record(HealthEvent::EngineLaunchFailed(error.to_string()));
    }

    fn engine_stopped(&self, snapshot: &EngineState) {
        self.record(HealthEvent::EngineStopped(snapshot.record.pid));
    }

    fn engine_gone(&self, state: &EngineState) {
        self.record(HealthEvent::EngineGone(state.record.pid));
    }
}
