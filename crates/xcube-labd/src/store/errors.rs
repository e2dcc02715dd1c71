//! Failures of [`JsonStore`](super::JsonStore) operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing a JSON document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("'{path}' does not exist")]
    NotFound {
        /// Missing document.
        path: PathBuf,
    },
    /// The parent directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading the document failed.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The document is not valid JSON for the expected record.
    #[error("failed to parse '{path}': {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising the record failed.
    #[error("failed to serialise record: {0}")]
    Serialise(#[source] serde_json::Error),
    /// Writing the document failed.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing the document failed.
    #[error("failed to remove '{path}': {source}")]
    Remove {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Whether the error only reports a missing document.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
