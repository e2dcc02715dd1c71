//! Engine process lifecycle.
//!
//! The engine is a single external server process. Its identity is persisted
//! in an [`EngineRecord`] so it survives daemon restarts; liveness is always
//! re-derived from the OS through a [`ProcessInspector`]. [`EngineManager`]
//! combines both behind idempotent `state`, `start` and `stop` operations.

mod errors;
mod inspector;
mod launcher;
mod manager;
mod output;
mod record;

pub use errors::EngineError;
pub use inspector::{InspectError, ProcessFacts, ProcessInspector, SystemInspector};
pub use launcher::{EngineLauncher, LaunchedEngine, SystemLauncher};
pub use manager::EngineManager;
pub use output::{ExitReport, OutputCapture};
pub use record::{EngineRecord, EngineState, EngineStatus};

pub(crate) const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");
