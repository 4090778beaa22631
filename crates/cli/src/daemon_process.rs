// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management: locating the `xg2gd` binary, spawning it in
//! the background, and probing/stopping an already-running instance via
//! its PID file. There is no IPC transport (spec §1 — the HTTP API surface
//! is an external collaborator), so "status" here means "is the process
//! alive", not a live RPC round-trip.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonProcessError {
    #[error("could not determine state directory: {0}")]
    StateDir(#[from] xg2g_daemon::LifecycleError),
    #[error("failed to spawn {path}: {source}")]
    Spawn { path: PathBuf, #[source] source: std::io::Error },
}

/// Locate the `xg2gd` binary: a sibling of the running `xg2g` executable,
/// falling back to `$PATH` lookup.
pub fn find_daemon_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("xg2gd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("xg2gd")
}

/// Start the daemon in the background, detached from this process's
/// stdio, and return its (best-effort immediate) PID.
pub fn start_daemon_background() -> Result<std::process::Child, DaemonProcessError> {
    let path = find_daemon_binary();
    Command::new(&path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|source| DaemonProcessError::Spawn { path, source })
}

/// Path to the PID file the daemon writes at startup (`Paths::lock_path`).
pub fn pid_path() -> Result<PathBuf, DaemonProcessError> {
    let state_dir = xg2g_daemon::env::state_dir()?;
    Ok(xg2g_daemon::lifecycle::Paths::new(state_dir).lock_path)
}

/// Read the PID recorded in the daemon's lock file, if present and parseable.
pub fn read_daemon_pid() -> Option<u32> {
    let path = pid_path().ok()?;
    let contents = std::fs::read_to_string(path).ok()?;
    contents.trim().parse().ok()
}

/// Check whether a process with the given PID is alive, using signal 0
/// (no-op delivery that still reports `ESRCH` for a dead process).
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Send SIGTERM, then poll for exit up to `timeout`; SIGKILL if it's still
/// alive afterward.
pub fn stop_daemon(pid: u32, timeout: Duration) -> bool {
    kill_signal("-15", pid);

    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    if process_exists(pid) {
        kill_signal("-9", pid);
        let start = Instant::now();
        while start.elapsed() < timeout {
            if !process_exists(pid) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
    !process_exists(pid)
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
