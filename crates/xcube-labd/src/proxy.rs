//! Detection of the Jupyter server-proxy extension.
//!
//! The proxy counts as available when the `@jupyterlab/server-proxy` lab
//! extension is installed in one of the Jupyter data directories and the
//! first `labconfig/page_config.json` found along the Jupyter config path does
//! not list it as disabled. Both search paths are fixed at construction so a
//! detector answers the same way for the lifetime of the daemon's
//! environment.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use xcube_lab_config::ProxyMode;

const PROXY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::proxy");
const EXTENSION_NAME: &str = "@jupyterlab/server-proxy";

/// Answers whether requests can be routed through the server proxy.
pub trait ProxyDetector: Send + Sync {
    /// Returns `true` when the proxy is installed and enabled.
    fn has_proxy(&self) -> bool;
}

/// Detector with a fixed answer, used for explicit configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticProxy(pub bool);

impl ProxyDetector for StaticProxy {
    fn has_proxy(&self) -> bool {
        self.0
    }
}

/// Builds the detector matching the configured policy.
#[must_use]
pub fn detector_for(mode: ProxyMode) -> Arc<dyn ProxyDetector> {
    match mode {
        ProxyMode::Enabled => Arc::new(StaticProxy(true)),
        ProxyMode::Disabled => Arc::new(StaticProxy(false)),
        ProxyMode::Auto => Arc::new(JupyterProxyDetector::from_env()),
    }
}

/// Filesystem probe over the Jupyter data and config search paths.
#[derive(Debug, Clone, Default)]
pub struct JupyterProxyDetector {
    data_dirs: Vec<PathBuf>,
    config_dirs: Vec<PathBuf>,
}

impl JupyterProxyDetector {
    /// Creates a detector over explicit search paths, highest priority first.
    #[must_use]
    pub fn new(data_dirs: Vec<PathBuf>, config_dirs: Vec<PathBuf>) -> Self {
        Self {
            data_dirs,
            config_dirs,
        }
    }

    /// Derives the search paths from the environment.
    ///
    /// Data directories: `JUPYTER_PATH` entries, `JUPYTER_DATA_DIR` (or the
    /// per-user default), `$VIRTUAL_ENV`/`$CONDA_PREFIX` `share/jupyter`, then
    /// the system locations. Config directories: `JUPYTER_CONFIG_DIR` (or
    /// `~/.jupyter`), `JUPYTER_CONFIG_PATH` entries, the environment prefix
    /// `etc/jupyter`, then the system locations.
    #[must_use]
    pub fn from_env() -> Self {
        let prefixes = environment_prefixes();

        let mut data_dirs = split_env_paths("JUPYTER_PATH");
        match env::var_os("JUPYTER_DATA_DIR") {
            Some(dir) => data_dirs.push(PathBuf::from(dir)),
            None => data_dirs.extend(user_data_dir()),
        }
        data_dirs.extend(prefixes.iter().map(|prefix| prefix.join("share/jupyter")));
        data_dirs.push(PathBuf::from("/usr/local/share/jupyter"));
        data_dirs.push(PathBuf::from("/usr/share/jupyter"));

        let mut config_dirs = Vec::new();
        match env::var_os("JUPYTER_CONFIG_DIR") {
            Some(dir) => config_dirs.push(PathBuf::from(dir)),
            None => config_dirs.extend(dirs::home_dir().map(|home| home.join(".jupyter"))),
        }
        config_dirs.extend(split_env_paths("JUPYTER_CONFIG_PATH"));
        config_dirs.extend(prefixes.iter().map(|prefix| prefix.join("etc/jupyter")));
        config_dirs.push(PathBuf::from("/usr/local/etc/jupyter"));
        config_dirs.push(PathBuf::from("/etc/jupyter"));

        Self::new(data_dirs, config_dirs)
    }

    fn is_installed(&self) -> bool {
        self.data_dirs.iter().any(|dir| {
            dir.join("labextensions")
                .join("@jupyterlab")
                .join("server-proxy")
                .is_dir()
        })
    }

    fn is_disabled(&self) -> bool {
        // Only the first page config found decides.
        let Some(page_config) = self
            .config_dirs
            .iter()
            .map(|dir| dir.join("labconfig").join("page_config.json"))
            .find(|path| path.is_file())
        else {
            return false;
        };
        disabled_in(&page_config)
    }
}

impl ProxyDetector for JupyterProxyDetector {
    fn has_proxy(&self) -> bool {
        let installed = self.is_installed();
        let available = installed && !self.is_disabled();
        debug!(
            target: PROXY_TARGET,
            installed,
            available,
            "server proxy detection finished"
        );
        available
    }
}

fn disabled_in(page_config: &Path) -> bool {
    let parsed = fs::read(page_config)
        .map_err(|error| error.to_string())
        .and_then(|bytes| {
            serde_json::from_slice::<Value>(&bytes).map_err(|error| error.to_string())
        });
    match parsed {
        Ok(document) => document
            .get("disabledExtensions")
            .and_then(|disabled| disabled.get(EXTENSION_NAME))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        Err(error) => {
            warn!(
                target: PROXY_TARGET,
                file = %page_config.display(),
                error = %error,
                "ignoring unreadable page config"
            );
            false
        }
    }
}

fn split_env_paths(key: &str) -> Vec<PathBuf> {
    env::var_os(key)
        .map(|value: OsString| {
            env::split_paths(&value)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn environment_prefixes() -> Vec<PathBuf> {
    ["VIRTUAL_ENV", "CONDA_PREFIX"]
        .iter()
        .filter_map(env::var_os)
        .map(PathBuf::from)
        .collect()
}

fn user_data_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    if cfg!(target_os = "macos") {
        Some(home.join("Library/Jupyter"))
    } else {
        Some(home.join(".local/share/jupyter"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    struct Layout {
        _root: TempDir,
        data: PathBuf,
        config: PathBuf,
        fallback_config: PathBuf,
    }

    impl Layout {
        fn new() -> Self {
            let root = TempDir::new().expect("temp dir");
            let data = root.path().join("data");
            let config = root.path().join("config");
            let fallback_config = root.path().join("fallback");
            Self {
                data,
                config,
                fallback_config,
                _root: root,
            }
        }

        fn install_extension(&self) {
            fs::create_dir_all(self.data.join("labextensions/@jupyterlab/server-proxy"))
                .expect("install extension");
        }

        fn write_page_config(dir: &Path, body: &str) {
            let labconfig = dir.join("labconfig");
            fs::create_dir_all(&labconfig).expect("labconfig dir");
            fs::write(labconfig.join("page_config.json"), body).expect("page config");
        }

        fn detector(&self) -> JupyterProxyDetector {
            JupyterProxyDetector::new(
                vec![self.data.clone()],
                vec![self.config.clone(), self.fallback_config.clone()],
            )
        }
    }

    #[test]
    fn absent_extension_means_no_proxy() {
        let layout = Layout::new();
        assert!(!layout.detector().has_proxy());
    }

    #[test]
    fn installed_extension_without_page_config_is_available() {
        let layout = Layout::new();
        layout.install_extension();
        assert!(layout.detector().has_proxy());
    }

    #[test]
    fn disabled_extension_is_unavailable() {
        let layout = Layout::new();
        layout.install_extension();
        Layout::write_page_config(
            &layout.config,
            r#"{"disabledExtensions": {"@jupyterlab/server-proxy": true}}"#,
        );
        assert!(!layout.detector().has_proxy());
    }

    #[test]
    fn first_page_config_found_decides() {
        let layout = Layout::new();
        layout.install_extension();
        Layout::write_page_config(&layout.config, r#"{"disabledExtensions": {}}"#);
        Layout::write_page_config(
            &layout.fallback_config,
            r#"{"disabledExtensions": {"@jupyterlab/server-proxy": true}}"#,
        );
        assert!(layout.detector().has_proxy());
    }

    #[test]
    fn malformed_page_config_does_not_disable() {
        let layout = Layout::new();
        layout.install_extension();
        Layout::write_page_config(&layout.config, "{oops");
        assert!(layout.detector().has_proxy());
    }

    #[test]
    fn explicit_modes_bypass_detection() {
        assert!(detector_for(ProxyMode::Enabled).has_proxy());
        assert!(!detector_for(ProxyMode::Disabled).has_proxy());
    }
}
