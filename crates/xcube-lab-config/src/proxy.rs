//! Policy for deciding the server-proxy capability.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Policy deciding whether the Jupyter server proxy is available.
///
/// The engine is started with `--revprefix /proxy/<port>` and lab info
/// reports `has_proxy: true` only when the policy resolves to available.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProxyMode {
    /// Probe the Jupyter data and config directories.
    #[default]
    Auto,
    /// Assume the proxy is installed and enabled.
    Enabled,
    /// Assume no proxy is available.
    Disabled,
}

/// Errors encountered while parsing a [`ProxyMode`] from text.
pub type ProxyModeParseError = strum::ParseError;
