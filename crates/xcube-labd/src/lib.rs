//! Engine lifecycle daemon for the xcube lab integration.
//!
//! The daemon keeps two small JSON documents in its data directory: the lab
//! info record announced by the front end, and the identity of the single
//! engine process it supervises. Both are exposed over HTTP:
//!
//! - `/xcube/labinfo` stores, returns, and removes the front end's URL
//!   together with the detected server-proxy capability.
//! - `/xcube/server` reports, starts, and stops the engine (`xcube serve`).
//!
//! Starting is idempotent: a live engine is reused rather than spawned again.
//! The engine record outlives the daemon, so a restarted daemon picks up the
//! engine launched by its predecessor. Liveness is never persisted; it is
//! re-read from the OS process table on every request.
//!
//! Configuration comes from [`xcube_lab_config`]. Lifecycle events flow
//! through a [`HealthReporter`] so operators see structured telemetry for
//! bootstrap and every engine transition.

mod bootstrap;
pub mod engine;
mod health;
pub mod http;
pub mod labinfo;
mod process;
pub mod proxy;
pub mod store;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{ServeError, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
