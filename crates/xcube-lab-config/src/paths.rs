//! Derives the artefact paths shared by the stores and the engine launcher.
//!
//! Every persisted file lives directly inside the data directory so the lab
//! info handlers, the engine manager and the engine itself agree on the
//! layout.

use std::fs::DirBuilder;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Canonical locations of the files kept in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: Utf8PathBuf,
    lab_info: Utf8PathBuf,
    engine_state: Utf8PathBuf,
    engine_config: Utf8PathBuf,
    engine_log: Utf8PathBuf,
}

impl DataPaths {
    /// Derives the artefact paths inside `data_dir`.
    #[must_use]
    pub fn new(data_dir: Utf8PathBuf) -> Self {
        Self {
            lab_info: data_dir.join("lab-info.json"),
            engine_state: data_dir.join("server-info.json"),
            engine_config: data_dir.join("xcube-server.yaml"),
            engine_log: data_dir.join("server-log.txt"),
            data_dir,
        }
    }

    /// Creates the data directory with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`DataPathsError::CreateDirectory`] when the directory cannot
    /// be created.
    pub fn prepare(&self) -> Result<(), DataPathsError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder
            .create(self.data_dir.as_std_path())
            .map_err(|source| DataPathsError::CreateDirectory {
                path: self.data_dir.clone(),
                source,
            })
    }

    /// Directory holding every artefact.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        self.data_dir.as_path()
    }

    /// Lab info record, `lab-info.json`.
    #[must_use]
    pub fn lab_info(&self) -> &Path {
        self.lab_info.as_std_path()
    }

    /// Engine record, `server-info.json`.
    #[must_use]
    pub fn engine_state(&self) -> &Path {
        self.engine_state.as_std_path()
    }

    /// Engine configuration, `xcube-server.yaml`.
    #[must_use]
    pub fn engine_config(&self) -> &Path {
        self.engine_config.as_std_path()
    }

    /// Engine log file handed to `--logfile`, `server-log.txt`.
    #[must_use]
    pub fn engine_log(&self) -> &Path {
        self.engine_log.as_std_path()
    }
}

/// Errors raised while preparing the data directory.
#[derive(Debug, Error)]
pub enum DataPathsError {
    /// Creating the data directory failed.
    #[error("failed to prepare data directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
