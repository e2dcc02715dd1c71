//! Stand-in engine executables.
//!
//! The scripts run with the data directory as their working directory and
//! append their PID to `spawns` there, so tests can count launches without
//! sharing state between data directories.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tempfile::TempDir;

const LONG_RUNNING: &str = "#!/bin/sh\necho $$ >> spawns\necho engine ready\nexec sleep 30\n";
const CRASHING: &str = "#!/bin/sh\necho $$ >> spawns\necho starting\necho boom >&2\nexit 7\n";

// Written once per test binary; executing a file another thread may still be
// writing fails with ETXTBSY.
static SCRIPTS: Lazy<Scripts> = Lazy::new(Scripts::write);

struct Scripts {
    dir: TempDir,
}

impl Scripts {
    fn write() -> Self {
        let dir = TempDir::new().expect("script directory");
        for (name, body) in [("long-running", LONG_RUNNING), ("crashing", CRASHING)] {
            let path = dir.path().join(name);
            fs::write(&path, body).expect("write engine script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("mark engine script executable");
        }
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Engine behaviours available to tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeEngine {
    /// Stays up until terminated.
    LongRunning,
    /// Prints to both streams and exits with status 7.
    Crashing,
    /// Points at a path that does not exist.
    Missing,
}

impl FakeEngine {
    /// Program path to configure as the engine binary.
    #[must_use]
    pub fn program(self) -> String {
        let path = match self {
            Self::LongRunning => SCRIPTS.path("long-running"),
            Self::Crashing => SCRIPTS.path("crashing"),
            Self::Missing => SCRIPTS.path("missing-engine"),
        };
        path.display().to_string()
    }
}

/// Number of engines launched with `data_dir` as working directory.
#[must_use]
pub fn spawn_count(data_dir: &Path) -> usize {
    fs::read_to_string(data_dir.join("spawns"))
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

/// Polls `condition` until it holds or a few seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    condition()
}
