//! Structured health reporting for daemon and engine lifecycle events.

use std::sync::Arc;

use crate::bootstrap::BootstrapError;
use crate::engine::{EngineError, EngineRecord, EngineState};

use xcube_lab_config::Config;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a new engine is launched.
    fn engine_starting(&self);

    /// Invoked after a new engine has been launched and recorded.
    fn engine_started(&self, record: &EngineRecord);

    /// Invoked when a start request finds the recorded engine still live.
    fn engine_reused(&self, state: &EngineState);

    /// Invoked when launching or recording a new engine fails.
    fn engine_launch_failed(&self, error: &EngineError);

    /// Invoked after the recorded engine has been stopped and forgotten.
    fn engine_stopped(&self, snapshot: &EngineState);

    /// Invoked when the recorded engine is found dead on a start request.
    fn engine_gone(&self, state: &EngineState);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn engine_starting(&self) {
        (**self).engine_starting();
    }

    fn engine_started(&self, record: &EngineRecord) {
        (**self).engine_started(record);
    }

    fn engine_reused(&self, state: &EngineState) {
        (**self).engine_reused(state);
    }

    fn engine_launch_failed(&self, error: &EngineError) {
        (**self).engine_launch_failed(error);
    }

    fn engine_stopped(&self, snapshot: &EngineState) {
        (**self).engine_stopped(snapshot);
    }

    fn engine_gone(&self, state: &EngineState) {
        (**self).engine_gone(state);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            data_dir = %config.data_dir(),
            engine_port = config.engine_port(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn engine_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_starting",
            "launching engine"
        );
    }

    fn engine_started(&self, record: &EngineRecord) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_started",
            pid = ?record.pid,
            port = ?record.port,
            "engine launched"
        );
    }

    fn engine_reused(&self, state: &EngineState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_reused",
            pid = ?state.record.pid,
            status = %state.status,
            "engine already running"
        );
    }

    fn engine_launch_failed(&self, error: &EngineError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "engine_launch_failed",
            error = %error,
            "engine failed to launch"
        );
    }

    fn engine_stopped(&self, snapshot: &EngineState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "engine_stopped",
            pid = ?snapshot.record.pid,
            status = %snapshot.status,
            "engine stopped"
        );
    }

    fn engine_gone(&self, state: &EngineState) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "engine_gone",
            pid = ?state.record.pid,
            exit_code = ?state.exit_code,
            "recorded engine is no longer live"
        );
    }
}
