//! The `http://host:port` endpoint the daemon's API binds to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// TCP endpoint the HTTP API binds to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenEndpoint {
    /// Host name or IP address.
    pub host: String,
    /// TCP port; `0` asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenEndpoint {
    /// Builds an endpoint from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Address string accepted by socket binding APIs.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "http://{}", self.bind_address())
    }
}

impl FromStr for ListenEndpoint {
    type Err = ListenParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        if url.scheme() != "http" {
            return Err(ListenParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ListenParseError::MissingHost(input.to_owned()))?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url
            .port()
            .ok_or_else(|| ListenParseError::MissingPort(input.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing a [`ListenEndpoint`] from text.
#[derive(Debug, Error)]
pub enum ListenParseError {
    /// Scheme was not `http`.
    #[error("unsupported listen scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// Port was missing from the address.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
