// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate. The core
//! (`xg2g-engine`) never reads the environment directly (spec §6); this
//! module is the one place that translates process environment into the
//! frozen config snapshot the engine accepts at construction.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve the state directory: `XG2G_STATE_DIR` > `XDG_STATE_HOME/xg2g` >
/// `~/.local/state/xg2g`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("XG2G_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("xg2g"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/xg2g"))
}

/// Path to the TOML config file, overridable via `XG2G_CONFIG`. Defaults to
/// `<state_dir>/config.toml`.
pub fn config_path(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("XG2G_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("config.toml"))
}

/// Override for the HLS artifact root, taking precedence over whatever the
/// TOML config names (empty disables playlist waiting per spec §4.E).
pub fn hls_root_override() -> Option<PathBuf> {
    std::env::var("XG2G_HLS_ROOT").ok().map(PathBuf::from)
}

/// `tracing_subscriber::EnvFilter` directive override, defaulting to "info"
/// when unset (mirrors the teacher's `RUST_LOG`/`OJ_LOG` convention).
pub fn log_filter() -> String {
    std::env::var("XG2G_LOG").unwrap_or_else(|_| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
