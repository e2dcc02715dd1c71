//! Builds the engine command line and spawns the engine.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info};

use xcube_lab_config::{Config, DataPaths};

use super::ENGINE_TARGET;
use super::errors::EngineError;
use super::output::OutputCapture;
use super::record::EngineRecord;
use crate::proxy::ProxyDetector;

/// Engine configuration written when none exists yet.
pub(crate) const DEFAULT_ENGINE_CONFIG: &str = "\
# xcube Server configuration file

DataStores:
  - Identifier: root
    StoreId: file
    StoreParams:
      root: .

  #- Identifier: my-s3-bucket
  #  StoreId: s3
  #  StoreParams:
  #    root:  my-s3-bucket
  #    storage_options:
  #      anon: False
  #      key: my_aws_access_key_id
  #      secret: my_aws_secret_access_key
";

/// A freshly spawned engine.
#[derive(Debug)]
pub struct LaunchedEngine {
    /// Record to persist for the new engine.
    pub record: EngineRecord,
    /// Output capture fed by the engine's pipes.
    pub capture: OutputCapture,
}

/// Spawns engine processes.
pub trait EngineLauncher: Send + Sync {
    /// Launches a new engine and returns immediately after spawning.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DefaultConfig`] when the engine configuration
    /// cannot be seeded, or [`EngineError::Launch`] when spawning fails.
    fn launch(&self) -> Result<LaunchedEngine, EngineError>;
}

/// Launcher running the configured engine binary.
pub struct SystemLauncher {
    binary: String,
    port: u16,
    paths: DataPaths,
    proxy: Arc<dyn ProxyDetector>,
}

impl SystemLauncher {
    /// Builds a launcher from explicit settings.
    #[must_use]
    pub fn new(
        binary: impl Into<String>,
        port: u16,
        paths: DataPaths,
        proxy: Arc<dyn ProxyDetector>,
    ) -> Self {
        Self {
            binary: binary.into(),
            port,
            paths,
            proxy,
        }
    }

    /// Builds a launcher from the daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config, proxy: Arc<dyn ProxyDetector>) -> Self {
        Self::new(
            config.engine_binary(),
            config.engine_port(),
            config.data_paths(),
            proxy,
        )
    }

    /// Command line for the next launch, program first.
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        let mut cmdline = vec![
            self.binary.clone(),
            "--logfile".to_owned(),
            self.paths.engine_log().display().to_string(),
            "--loglevel".to_owned(),
            "DETAIL".to_owned(),
            "serve".to_owned(),
            "-v".to_owned(),
            "--config".to_owned(),
            self.paths.engine_config().display().to_string(),
            "--port".to_owned(),
            self.port.to_string(),
            "--update-after".to_owned(),
            "1".to_owned(),
        ];
        if self.proxy.has_proxy() {
            cmdline.push("--revprefix".to_owned());
            cmdline.push(format!("/proxy/{}", self.port));
        }
        cmdline
    }
}

impl EngineLauncher for SystemLauncher {
    fn launch(&self) -> Result<LaunchedEngine, EngineError> {
        let config_path = self.paths.engine_config();
        seed_default_config(config_path).map_err(|source| EngineError::DefaultConfig {
            path: config_path.to_path_buf(),
            source,
        })?;

        let cmdline = self.command_line();
        let (program, args) = cmdline
            .split_first()
            .ok_or_else(|| EngineError::Launch {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
            })?;
        let child = Command::new(program)
            .args(args)
            .current_dir(self.paths.data_dir().as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: program.clone(),
                source,
            })?;

        let pid = child.id();
        info!(
            target: ENGINE_TARGET,
            pid,
            port = self.port,
            program = %program,
            "engine spawned"
        );
        Ok(LaunchedEngine {
            record: EngineRecord {
                pid: Some(pid),
                port: Some(self.port),
                cmdline,
            },
            capture: OutputCapture::attach(child),
        })
    }
}

/// Writes the default configuration unless a file already exists.
fn seed_default_config(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_ENGINE_CONFIG.as_bytes())?;
            debug!(
                target: ENGINE_TARGET,
                file = %path.display(),
                "default engine configuration written"
            );
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(error) => Err(error),
    }
}
