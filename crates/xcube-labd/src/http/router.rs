//! Route table and shared handler state.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::engine::EngineManager;
use crate::labinfo::LabInfoStore;

use super::handlers::{
    delete_labinfo, delete_server, get_labinfo, get_server, put_labinfo, put_server,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub(super) engine: Arc<EngineManager>,
    pub(super) labinfo: Arc<LabInfoStore>,
}

impl AppState {
    /// Bundles the engine manager and lab info store for the handlers.
    #[must_use]
    pub fn new(engine: Arc<EngineManager>, labinfo: Arc<LabInfoStore>) -> Self {
        Self { engine, labinfo }
    }
}

/// Builds the API router mounted under `base_path`.
///
/// `base_path` is either empty or starts with `/` and has no trailing slash.
pub fn router(state: AppState, base_path: &str) -> Router {
    let api = Router::new()
        .route(
            "/xcube/labinfo",
            get(get_labinfo).put(put_labinfo).delete(delete_labinfo),
        )
        .route(
            "/xcube/server",
            get(get_server).put(put_server).delete(delete_server),
        )
        .with_state(state);

    if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    }
}
