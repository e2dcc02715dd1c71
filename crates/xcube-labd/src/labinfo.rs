//! Front-end registration record.
//!
//! The lab front end announces the URL it is served from; the daemon stores
//! it together with the server-proxy capability so engine URLs can be derived
//! for later responses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::engine::EngineState;
use crate::proxy::ProxyDetector;
use crate::store::{JsonStore, StoreError};

const LABINFO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::labinfo");
const LAB_URL_KEY: &str = "lab_url";
const VIEWER_SERVER_NAME: &str = "xcube JupyterLab Integration";
const VIEWER_SERVER_ID: &str = "jupyterlab";

/// Persisted lab information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabInfoRecord {
    /// URL the lab front end is served from.
    pub lab_url: String,
    /// Whether engine traffic can be routed through the server proxy.
    #[serde(default)]
    pub has_proxy: bool,
}

impl LabInfoRecord {
    /// URL at which the front end reaches an engine listening on `port`.
    #[must_use]
    pub fn engine_url(&self, port: u16) -> String {
        if self.has_proxy {
            let separator = if self.lab_url.ends_with('/') { "" } else { "/" };
            format!("{}{separator}proxy/{port}", self.lab_url)
        } else {
            format!("http://127.0.0.1:{port}")
        }
    }

    /// Viewer entry point served by the engine at `engine_url`.
    ///
    /// Returns `None` when `engine_url` is not an absolute URL.
    #[must_use]
    pub fn viewer_url(engine_url: &str) -> Option<String> {
        let mut viewer = Url::parse(&format!("{engine_url}/viewer/")).ok()?;
        viewer
            .query_pairs_mut()
            .append_pair("serverUrl", engine_url)
            .append_pair("serverName", VIEWER_SERVER_NAME)
            .append_pair("serverId", VIEWER_SERVER_ID)
            .append_pair("compact", "1");
        Some(viewer.into())
    }

    /// Adds `url` and `viewer_url` to `state` when it carries a port.
    pub fn attach_urls(&self, state: &mut EngineState) {
        let Some(port) = state.record.port else {
            return;
        };
        let url = self.engine_url(port);
        state.viewer_url = Self::viewer_url(&url);
        state.url = Some(url);
    }
}

/// Errors raised by lab info operations.
#[derive(Debug, Error)]
pub enum LabInfoError {
    /// No lab info has been stored.
    #[error("lab info not found")]
    NotFound,
    /// The request body does not carry a usable `lab_url`.
    #[error("missing or invalid lab info in request body")]
    Validation,
    /// Persisting or reading the record failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lab info persistence with validation and proxy detection.
pub struct LabInfoStore {
    store: JsonStore<LabInfoRecord>,
    proxy: Arc<dyn ProxyDetector>,
}

impl LabInfoStore {
    /// Creates a store persisting to `store`, consulting `proxy` on writes.
    #[must_use]
    pub fn new(store: JsonStore<LabInfoRecord>, proxy: Arc<dyn ProxyDetector>) -> Self {
        Self { store, proxy }
    }

    /// Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`LabInfoError::NotFound`] when nothing has been stored.
    pub fn get(&self) -> Result<LabInfoRecord, LabInfoError> {
        self.store.load().map_err(not_found_or_store)
    }

    /// Returns the stored record, or `None` when nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing record cannot be read.
    pub fn find(&self) -> Result<Option<LabInfoRecord>, LabInfoError> {
        match self.store.load() {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Validates `body`, records the proxy capability, and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`LabInfoError::Validation`] unless `body` is an object with a
    /// non-empty string `lab_url`.
    pub fn put(&self, body: &Value) -> Result<LabInfoRecord, LabInfoError> {
        let lab_url = body
            .get(LAB_URL_KEY)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or(LabInfoError::Validation)?;
        let record = LabInfoRecord {
            lab_url: lab_url.to_owned(),
            has_proxy: self.proxy.has_proxy(),
        };
        self.store.save(&record)?;
        info!(
            target: LABINFO_TARGET,
            lab_url = %record.lab_url,
            has_proxy = record.has_proxy,
            "lab info stored"
        );
        Ok(record)
    }

    /// Removes the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`LabInfoError::NotFound`] when nothing has been stored.
    pub fn delete(&self) -> Result<(), LabInfoError> {
        self.store.delete().map_err(not_found_or_store)?;
        info!(target: LABINFO_TARGET, "lab info removed");
        Ok(())
    }
}

fn not_found_or_store(error: StoreError) -> LabInfoError {
    if error.is_not_found() {
        LabInfoError::NotFound
    } else {
        LabInfoError::Store(error)
    }
}
