//! Defines the error surface for running the daemon.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;

use super::shutdown::ShutdownError;

/// Errors surfaced while running the daemon process.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The async runtime could not be built.
    #[error("failed to build async runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Binding the HTTP listener failed.
    #[error("failed to bind '{address}': {source}")]
    Bind {
        /// Address that could not be bound.
        address: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("http server failed: {source}")]
    Serve {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for ServeError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ShutdownError> for ServeError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
