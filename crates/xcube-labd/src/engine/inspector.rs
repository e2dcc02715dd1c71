//! OS process queries and termination.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System, Users};
use thiserror::Error;

use super::record::EngineStatus;

/// Facts reported by the OS about a live process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFacts {
    /// Coarse status.
    pub status: EngineStatus,
    /// Executable name.
    pub name: String,
    /// Owner's user name, when it can be resolved.
    pub username: Option<String>,
    /// Command line as reported by the OS.
    pub cmdline: Vec<String>,
}

/// Errors raised while inspecting or signalling a process.
#[derive(Debug, Error)]
pub enum InspectError {
    /// No process with the PID exists.
    #[error("process {pid} not found")]
    ProcessNotFound {
        /// Queried PID.
        pid: u32,
    },
    /// Delivering the termination signal failed.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target PID.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
}

/// Access to the OS process table.
pub trait ProcessInspector: Send + Sync {
    /// Describes the process `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::ProcessNotFound`] when `pid` is not in the
    /// process table.
    fn inspect(&self, pid: u32) -> Result<ProcessFacts, InspectError>;

    /// Requests graceful termination of `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::ProcessNotFound`] when `pid` is already gone
    /// or does not name a single process.
    fn terminate(&self, pid: u32) -> Result<(), InspectError>;
}

/// Inspector backed by `sysinfo` queries and `SIGTERM`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInspector;

impl SystemInspector {
    /// Builds a new inspector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProcessInspector for SystemInspector {
    fn inspect(&self, pid: u32) -> Result<ProcessFacts, InspectError> {
        if pid == 0 {
            return Err(InspectError::ProcessNotFound { pid });
        }
        let target = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[target]));
        let process = system
            .process(target)
            .ok_or(InspectError::ProcessNotFound { pid })?;

        let status = map_status(process.status()).ok_or(InspectError::ProcessNotFound { pid })?;
        let username = process.user_id().and_then(|uid| {
            Users::new_with_refreshed_list()
                .get_user_by_id(uid)
                .map(|user| user.name().to_owned())
        });
        Ok(ProcessFacts {
            status,
            name: process.name().to_string_lossy().into_owned(),
            username,
            cmdline: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
        })
    }

    fn terminate(&self, pid: u32) -> Result<(), InspectError> {
        // `kill(0, ..)` would signal this daemon's own process group.
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or(InspectError::ProcessNotFound { pid })?;
        match signal::kill(NixPid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(InspectError::ProcessNotFound { pid }),
            Err(source) => Err(InspectError::Signal { pid, source }),
        }
    }
}

/// Maps an OS status onto the reported vocabulary. `None` means the process
/// is dead and should be reported as gone.
fn map_status(status: ProcessStatus) -> Option<EngineStatus> {
    match status {
        ProcessStatus::Run => Some(EngineStatus::Running),
        ProcessStatus::Stop | ProcessStatus::Tracing => Some(EngineStatus::Stopped),
        ProcessStatus::Zombie => Some(EngineStatus::Zombie),
        ProcessStatus::Dead => None,
        _ => Some(EngineStatus::Sleeping),
    }
}
