//! Built-in values used when no layer sets a field.

use camino::Utf8PathBuf;
use std::env;

use dirs::home_dir;

use crate::listen::ListenEndpoint;

/// Engine executable launched when none is configured.
pub const DEFAULT_ENGINE_BINARY: &str = "xcube";

/// Port handed to the engine when none is configured.
pub const DEFAULT_ENGINE_PORT: u16 = 9192;

/// Port the daemon's HTTP API listens on by default.
pub const DEFAULT_HTTP_PORT: u16 = 9180;

/// Route prefix used when the daemon is not mounted behind a base URL.
pub const DEFAULT_BASE_URL: &str = "/";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns [`DEFAULT_LOG_FILTER`] for callers that need a function path.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Loopback endpoint for the HTTP API.
#[must_use]
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::new("127.0.0.1", DEFAULT_HTTP_PORT)
}

/// Per-user data directory, `~/.xcube`.
///
/// Falls back to the system temporary directory when no home directory can be
/// determined.
#[must_use]
pub fn default_data_dir() -> Utf8PathBuf {
    let mut base = home_directory().unwrap_or_else(fallback_base_directory);
    base.push(".xcube");
    base
}

fn home_directory() -> Option<Utf8PathBuf> {
    home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
