//! Daemon runtime: bind the HTTP listener, serve, and shut down on signal.

use std::time::Duration;

mod errors;
pub(crate) mod serve;
pub(crate) mod shutdown;

pub use errors::ServeError;
pub use serve::run_daemon;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const DRAIN_BUDGET: Duration = Duration::from_secs(10);
