//! Flat JSON document persistence.
//!
//! Each [`JsonStore`] owns exactly one file. Loading tolerates a missing file
//! when the caller asks for a default, saving creates the parent directories
//! and replaces the document atomically, and deleting reports a missing file
//! as [`StoreError::NotFound`] so callers can surface "nothing there".

mod errors;

use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::Builder;
use tracing::debug;

pub use errors::StoreError;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Typed access to a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a store backed by `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Whether the backing document currently exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the file is absent, or a read or
    /// parse error when it cannot be decoded.
    pub fn load(&self) -> Result<T, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Persists `record`, creating parent directories on demand.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created, the record
    /// cannot be serialised, or the file cannot be written.
    pub fn save(&self, record: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut payload = serde_json::to_vec_pretty(record).map_err(StoreError::Serialise)?;
        payload.push(b'\n');
        atomic_write(&self.path, &payload).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            target: STORE_TARGET,
            file = %self.path.display(),
            "document saved"
        );
        Ok(())
    }

    /// Removes the document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when there is nothing to remove.
    pub fn delete(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(
                    target: STORE_TARGET,
                    file = %self.path.display(),
                    "document removed"
                );
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: self.path.clone(),
            }),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Reads the document, yielding `T::default()` when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error only when an existing file cannot be read or parsed.
    pub fn load_or_default(&self) -> Result<T, StoreError> {
        match self.load() {
            Err(StoreError::NotFound { .. }) => Ok(T::default()),
            other => other,
        }
    }
}

fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("xcube-lab"),
    );
    #[cfg(unix)]
    {
        builder.permissions(fs::Permissions::from_mode(0o600));
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
