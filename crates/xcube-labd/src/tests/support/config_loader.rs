//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use xcube_lab_config::{Config, ListenEndpoint, ProxyMode};

use crate::bootstrap::ConfigLoader;

use super::engine::FakeEngine;

/// Loader that isolates the data directory under a temporary directory.
pub struct TestConfigLoader {
    root: Arc<TempDir>,
    config: Config,
}

impl TestConfigLoader {
    /// Loader launching the long-running fake engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine(FakeEngine::LongRunning)
    }

    /// Loader launching `engine`.
    #[must_use]
    pub fn with_engine(engine: FakeEngine) -> Self {
        let root = TempDir::new().expect("failed to create temporary directory");
        let data_dir = Utf8PathBuf::from_path_buf(root.path().join("xcube"))
            .expect("temporary directory was not valid UTF-8");
        let config = Config {
            data_dir,
            engine_binary: engine.program(),
            listen: ListenEndpoint::new("127.0.0.1", free_port()),
            proxy_mode: ProxyMode::Disabled,
            ..Config::default()
        };
        Self {
            root: Arc::new(root),
            config,
        }
    }

    /// Mounts the API under `base_url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_owned();
        self
    }

    /// Configuration handed to bootstrap.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Data directory of this loader.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.config.data_dir.as_std_path()
    }

    /// Scratch directory outside the data directory.
    #[must_use]
    pub fn scratch(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

impl Clone for TestConfigLoader {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            config: self.config.clone(),
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("xcube-labd"),
            OsString::from("--listen"),
            OsString::from("tcp://127.0.0.1:9180"),
        ];
        Config::load_from_iter(args)
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|address| address.port())
        .expect("failed to reserve a local port")
}
