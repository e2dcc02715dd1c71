//! Failures of engine lifecycle operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by engine lifecycle operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine record exists.
    #[error("engine has not been started")]
    NotStarted,
    /// Spawning the engine failed.
    #[error("failed to launch engine '{program}': {source}")]
    Launch {
        /// Program that could not be spawned.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The default engine configuration could not be written.
    #[error("failed to write default engine configuration '{path}': {source}")]
    DefaultConfig {
        /// Configuration path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading or writing the engine record failed.
    #[error("engine record unavailable: {0}")]
    Store(#[from] StoreError),
}
