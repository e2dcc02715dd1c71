//! Shared configuration for the xcube lab service.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional TOML file (`--config-path` or `XCUBE_LAB_CONFIG_PATH`), then
//! `XCUBE_LAB_*` environment variables, then command-line flags. The resolved
//! [`Config`] tells the daemon where its data directory lives, which engine
//! binary to launch on which port, and where to listen for HTTP requests.

mod defaults;
mod listen;
mod logging;
mod paths;
mod proxy;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BASE_URL, DEFAULT_ENGINE_BINARY, DEFAULT_ENGINE_PORT, DEFAULT_HTTP_PORT,
    DEFAULT_LOG_FILTER, default_data_dir, default_listen_endpoint, default_log_filter,
    default_log_format,
};
pub use listen::{ListenEndpoint, ListenParseError};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::{DataPaths, DataPathsError};
pub use proxy::{ProxyMode, ProxyModeParseError};

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "XCUBE_LAB")]
pub struct Config {
    /// Directory holding lab info, engine state, engine config and log.
    pub data_dir: Utf8PathBuf,
    /// Engine executable, resolved through `PATH` when not absolute.
    pub engine_binary: String,
    /// Port the engine is told to listen on.
    pub engine_port: u16,
    /// HTTP endpoint the daemon binds to.
    pub listen: ListenEndpoint,
    /// URL prefix the API routes are mounted under.
    pub base_url: String,
    /// How the server-proxy capability is determined.
    pub proxy_mode: ProxyMode,
    /// Tracing filter expression.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            engine_binary: DEFAULT_ENGINE_BINARY.to_owned(),
            engine_port: DEFAULT_ENGINE_PORT,
            listen: default_listen_endpoint(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            proxy_mode: ProxyMode::default(),
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory holding the persisted artefacts.
    #[must_use]
    pub fn data_dir(&self) -> &camino::Utf8Path {
        self.data_dir.as_path()
    }

    /// Engine executable name or path.
    #[must_use]
    pub fn engine_binary(&self) -> &str {
        &self.engine_binary
    }

    /// Port handed to the engine via `--port`.
    #[must_use]
    pub const fn engine_port(&self) -> u16 {
        self.engine_port
    }

    /// HTTP endpoint for the daemon.
    #[must_use]
    pub const fn listen(&self) -> &ListenEndpoint {
        &self.listen
    }

    /// Route prefix normalised to start with `/` and carry no trailing `/`.
    ///
    /// The root prefix is returned as an empty string.
    #[must_use]
    pub fn base_path(&self) -> String {
        let trimmed = self.base_url.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Proxy detection policy.
    #[must_use]
    pub const fn proxy_mode(&self) -> ProxyMode {
        self.proxy_mode
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Artefact paths derived from [`Config::data_dir`].
    #[must_use]
    pub fn data_paths(&self) -> DataPaths {
        DataPaths::new(self.data_dir.clone())
    }
}
