//! HTTP surface of the daemon.
//!
//! Two resources are exposed under the configured base path:
//! `/xcube/labinfo` for the front-end registration record and
//! `/xcube/server` for the engine. Engine and lab info operations touch the
//! filesystem and the process table, so handlers run them on the blocking
//! pool.

mod errors;
mod handlers;
mod router;

pub use errors::ApiError;
pub use router::{AppState, router};

pub(crate) const HTTP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::http");
