//! Test harness utilities shared by the daemon suites.

mod config_loader;
mod engine;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use engine::{FakeEngine, spawn_count, wait_until};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
