// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration for `xg2gd`, with environment overrides layered on top
//! (spec §6 "environment knobs"; SPEC_FULL.md §2). This is the one place
//! outside the engine that resolves a frozen [`OrchestratorConfig`] snapshot
//! — the engine itself never reads a file or the environment (spec §4.E).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use xg2g_engine::{OrchestratorConfig, SweeperConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root config document. Every field defaults to a production-sane value so
/// a missing or empty `config.toml` still produces a working daemon.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Capacity set: `tunerSlots` (spec §4.E).
    pub tuner_slots: Vec<u32>,
    pub lease_ttl_secs: u64,
    pub pipeline_stop_timeout_secs: u64,
    pub start_concurrency: usize,
    pub stop_concurrency: usize,
    pub sweeper: SweeperSection,
    /// Filesystem root for per-session HLS artifacts. Empty disables
    /// playlist waiting (spec §4.E).
    pub hls_root: Option<PathBuf>,
    /// Binary invoked once per session by `SubprocessPipeline`.
    pub pipeline_binary: String,
    /// Outbound-HTTP allowlist checked before a direct-URL source is
    /// started (spec §4.E step 7).
    pub allowed_url_prefixes: Vec<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tuner_slots: vec![0, 1, 2, 3],
            lease_ttl_secs: 30,
            pipeline_stop_timeout_secs: 10,
            start_concurrency: 8,
            stop_concurrency: 8,
            sweeper: SweeperSection::default(),
            hls_root: None,
            pipeline_binary: "xg2g-transcoder".to_string(),
            allowed_url_prefixes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweeperSection {
    pub interval_secs: u64,
    pub session_retention_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    /// Defaults to `session_retention_secs` when unset (spec §9 open
    /// question (c); see DESIGN.md).
    pub file_retention_secs: Option<u64>,
}

impl Default for SweeperSection {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            session_retention_secs: 3600,
            idle_timeout_secs: Some(7200),
            file_retention_secs: None,
        }
    }
}

impl DaemonConfig {
    /// Load from `path` if it exists, falling back to defaults; then apply
    /// environment overrides (`XG2G_HLS_ROOT` beats whatever the TOML
    /// names).
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path: path.to_owned(), source }),
        };
        if let Some(root) = crate::env::hls_root_override() {
            config.hls_root = Some(root);
        }
        Ok(config)
    }

    /// Build the frozen [`OrchestratorConfig`] the engine accepts at
    /// construction, with `owner` supplied by the platform port's
    /// `identity()` (spec §4.E: "stable, unique per process").
    pub fn to_orchestrator_config(&self, owner: impl Into<String>) -> OrchestratorConfig {
        let sweeper = SweeperConfig {
            interval: Duration::from_secs(self.sweeper.interval_secs),
            session_retention: Duration::from_secs(self.sweeper.session_retention_secs),
            idle_timeout: self.sweeper.idle_timeout_secs.map(Duration::from_secs),
            file_retention: self.sweeper.file_retention_secs.map(Duration::from_secs),
        };
        OrchestratorConfig::new(
            self.tuner_slots.clone(),
            Duration::from_secs(self.lease_ttl_secs),
            Duration::from_secs(self.pipeline_stop_timeout_secs),
            owner,
            self.start_concurrency,
            self.stop_concurrency,
            sweeper,
            self.hls_root.clone(),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
