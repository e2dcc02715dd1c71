//! Test suites for the xcube lab daemon.

mod engine_behaviour;
pub(crate) mod support;
