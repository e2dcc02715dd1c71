//! Persisted engine identity and the live state derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the last launched engine, persisted in `server-info.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRecord {
    /// OS process id; absent when no engine has been launched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Port the engine was told to listen on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Command line used for the launch.
    #[serde(default)]
    pub cmdline: Vec<String>,
}

/// Coarse process status reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Executing or runnable.
    Running,
    /// Blocked, idle, or in an unclassified wait.
    Sleeping,
    /// Stopped by a signal or a tracer.
    Stopped,
    /// Exited but not yet reaped.
    Zombie,
    /// No longer present in the process table.
    Gone,
}

impl EngineStatus {
    /// Whether a process in this status still occupies the engine slot.
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Zombie | Self::Gone)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Sleeping => "sleeping",
            Self::Stopped => "stopped",
            Self::Zombie => "zombie",
            Self::Gone => "gone",
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body describing the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Persisted identity.
    #[serde(flatten)]
    pub record: EngineRecord,
    /// Live status.
    pub status: EngineStatus,
    /// Process name reported by the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owner of the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Command line reported by the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_cmdline: Option<Vec<String>>,
    /// Captured standard output, once the engine has exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured standard error, once the engine has exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Exit code, once the engine has exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// URL the front end reaches the engine at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Viewer entry point for the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_url: Option<String>,
}

impl EngineState {
    /// State for a record whose process is no longer in the process table.
    #[must_use]
    pub fn gone(record: EngineRecord) -> Self {
        Self::with_status(record, EngineStatus::Gone)
    }

    pub(crate) fn with_status(record: EngineRecord, status: EngineStatus) -> Self {
        Self {
            record,
            status,
            name: None,
            username: None,
            process_cmdline: None,
            stdout: None,
            stderr: None,
            exit_code: None,
            url: None,
            viewer_url: None,
        }
    }
}
