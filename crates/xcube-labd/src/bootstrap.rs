//! Daemon bootstrap orchestration.

use std::sync::Arc;

use axum::Router;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use xcube_lab_config::{Config, DataPathsError};

use crate::engine::{EngineManager, SystemInspector, SystemLauncher};
use crate::health::HealthReporter;
use crate::http::{self, AppState};
use crate::labinfo::LabInfoStore;
use crate::proxy;
use crate::store::JsonStore;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The data directory could not be prepared.
    #[error("failed to prepare data directory: {source}")]
    DataDirectory {
        /// Underlying filesystem error.
        #[source]
        source: DataPathsError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    engine: Arc<EngineManager>,
    labinfo: Arc<LabInfoStore>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Engine lifecycle manager shared with the HTTP handlers.
    #[must_use]
    pub fn engine(&self) -> &Arc<EngineManager> {
        &self.engine
    }

    /// Lab info store shared with the HTTP handlers.
    #[must_use]
    pub fn labinfo(&self) -> &Arc<LabInfoStore> {
        &self.labinfo
    }

    /// Builds the HTTP router mounted under the configured base path.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState::new(Arc::clone(&self.engine), Arc::clone(&self.labinfo));
        http::router(state, &self.config.base_path())
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration, telemetry, or the data
/// directory cannot be set up. Every failure is also reported to `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let paths = config.data_paths();
    if let Err(source) = paths.prepare() {
        let error = BootstrapError::DataDirectory { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let proxy = proxy::detector_for(config.proxy_mode());
    let labinfo = Arc::new(LabInfoStore::new(
        JsonStore::new(paths.lab_info()),
        Arc::clone(&proxy),
    ));
    let engine = Arc::new(EngineManager::new(
        JsonStore::new(paths.engine_state()),
        Arc::new(SystemInspector::new()),
        Arc::new(SystemLauncher::from_config(&config, proxy)),
        Arc::clone(&reporter),
    ));
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        engine,
        labinfo,
        telemetry,
    })
}
