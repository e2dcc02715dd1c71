//! BDD test world: encapsulates loader, reporter, and daemon state for step functions.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::engine::{EngineError, EngineState};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::engine::FakeEngine;
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    data_dir: Option<PathBuf>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    engine_results: Vec<Result<EngineState, EngineError>>,
}

impl TestWorld {
    /// Builds a world launching the long-running fake engine.
    #[must_use]
    pub fn new() -> Self {
        let loader = TestConfigLoader::new();
        Self {
            data_dir: Some(loader.data_dir().to_path_buf()),
            loader: Box::new(loader),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            bootstrap_error: None,
            engine_results: Vec::new(),
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.data_dir = None;
        self.reset_results();
    }

    /// Installs a loader launching `engine`.
    pub fn use_engine(&mut self, engine: FakeEngine) {
        let loader = TestConfigLoader::with_engine(engine);
        self.data_dir = Some(loader.data_dir().to_path_buf());
        self.loader = Box::new(loader);
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(daemon) => {
                self.daemon = Some(daemon);
            }
            Err(error) => {
                self.bootstrap_error = Some(error);
            }
        }
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the daemon, bootstrapping it on first use.
    pub fn daemon(&mut self) -> &Daemon {
        self.bootstrap();
        match self.daemon.as_ref() {
            Some(daemon) => daemon,
            None => panic!("bootstrap failed: {:?}", self.bootstrap_error),
        }
    }

    /// Data directory of the configured loader.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .expect("the configured loader has no data directory")
    }

    /// Starts the engine and records the outcome.
    pub fn start_engine(&mut self) {
        let result = self.daemon().engine().start();
        self.engine_results.push(result);
    }

    /// Starts the engine from `callers` threads at once.
    pub fn start_engine_concurrently(&mut self, callers: usize) {
        let engine = Arc::clone(self.daemon().engine());
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..callers)
                .map(|_| scope.spawn(|| engine.start()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("start thread panicked"))
                .collect()
        });
        self.engine_results.extend(results);
    }

    /// Stops the engine and records the outcome.
    pub fn stop_engine(&mut self) {
        let result = self.daemon().engine().stop();
        self.engine_results.push(result);
    }

    /// Queries the engine and records the outcome.
    pub fn query_engine(&mut self) {
        let result = self.daemon().engine().state();
        self.engine_results.push(result);
    }

    /// Outcomes of the engine operations run so far, oldest first.
    #[must_use]
    pub fn engine_results(&self) -> &[Result<EngineState, EngineError>] {
        &self.engine_results
    }

    /// Outcome of the latest engine operation.
    #[must_use]
    pub fn last_engine_result(&self) -> &Result<EngineState, EngineError> {
        self.engine_results
            .last()
            .expect("no engine operation has run")
    }

    fn reset_results(&mut self) {
        self.daemon = None;
        self.bootstrap_error = None;
        self.engine_results.clear();
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(daemon) = self.daemon.as_ref() {
            let _ = daemon.engine().stop();
        }
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
