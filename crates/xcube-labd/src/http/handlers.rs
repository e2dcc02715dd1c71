//! Request handlers; blocking work runs on the tokio blocking pool.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::{Value, json};
use tokio::task;
use tracing::{debug, warn};

use crate::engine::EngineState;
use crate::labinfo::LabInfoRecord;

use super::HTTP_TARGET;
use super::errors::ApiError;
use super::router::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn run_blocking<T, F>(operation: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(operation).await?.map(Json)
}

pub(super) async fn get_labinfo(State(state): State<AppState>) -> ApiResult<LabInfoRecord> {
    run_blocking(move || Ok(state.labinfo.get()?)).await
}

pub(super) async fn put_labinfo(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<LabInfoRecord> {
    let body: Value = serde_json::from_slice(&body).map_err(ApiError::Body)?;
    run_blocking(move || Ok(state.labinfo.put(&body)?)).await
}

pub(super) async fn delete_labinfo(State(state): State<AppState>) -> ApiResult<Value> {
    run_blocking(move || {
        state.labinfo.delete()?;
        Ok(json!({}))
    })
    .await
}

pub(super) async fn get_server(State(state): State<AppState>) -> ApiResult<EngineState> {
    run_blocking(move || {
        let engine = state.engine.state()?;
        Ok(with_urls(&state, engine))
    })
    .await
}

pub(super) async fn put_server(State(state): State<AppState>) -> ApiResult<EngineState> {
    run_blocking(move || {
        let engine = state.engine.start()?;
        Ok(with_urls(&state, engine))
    })
    .await
}

pub(super) async fn delete_server(State(state): State<AppState>) -> ApiResult<EngineState> {
    run_blocking(move || {
        let snapshot = state.engine.stop()?;
        Ok(with_urls(&state, snapshot))
    })
    .await
}

/// Decorates `engine` with front-end URLs when lab info is available.
fn with_urls(state: &AppState, mut engine: EngineState) -> EngineState {
    match state.labinfo.find() {
        Ok(Some(lab)) => lab.attach_urls(&mut engine),
        Ok(None) => debug!(target: HTTP_TARGET, "no lab info; engine URLs omitted"),
        Err(error) => {
            warn!(target: HTTP_TARGET, %error, "lab info unreadable; engine URLs omitted");
        }
    }
    engine
}
