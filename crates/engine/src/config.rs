// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator configuration: a frozen, pre-validated snapshot (spec
//! §4.E). The engine never reads environment variables or files directly —
//! loading TOML + environment overrides into this struct is the daemon
//! binary's job (`xg2g-daemon::config`).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::events::{default_lease_key_func, LeaseKeyFunc};

/// All fields mandatory unless noted (spec §4.E). Validated once, at
/// startup, before any I/O.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Ordered list of small integers; the tuner capacity set.
    pub tuner_slots: Vec<u32>,
    pub lease_ttl: Duration,
    /// Fixed at `lease_ttl / 2` by [`OrchestratorConfig::new`]; must be
    /// strictly less than `lease_ttl`.
    pub heartbeat_every: Duration,
    pub pipeline_stop_timeout: Duration,
    /// Stable, unique per process (hostname + pid + random, per the
    /// platform port's `identity()`).
    pub owner: String,
    pub start_concurrency: usize,
    pub stop_concurrency: usize,
    pub lease_key_func: LeaseKeyFunc,
    pub sweeper: SweeperConfig,
    /// Filesystem root for per-session artifacts. `None` disables playlist
    /// waiting entirely (the start handler transitions straight to `Ready`
    /// on pipeline health rather than polling a playlist file).
    pub hls_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
    pub session_retention: Duration,
    pub idle_timeout: Option<Duration>,
    /// Defaults to `session_retention` when unset (spec §9 open question
    /// (c); decided in DESIGN.md).
    pub file_retention: Option<Duration>,
}

impl SweeperConfig {
    pub fn effective_file_retention(&self) -> Duration {
        self.file_retention.unwrap_or(self.session_retention)
    }
}

impl OrchestratorConfig {
    /// Build a config with `heartbeat_every` derived as `lease_ttl / 2`, the
    /// spec's "by construction" relationship (spec §4.E).
    pub fn new(
        tuner_slots: Vec<u32>,
        lease_ttl: Duration,
        pipeline_stop_timeout: Duration,
        owner: impl Into<String>,
        start_concurrency: usize,
        stop_concurrency: usize,
        sweeper: SweeperConfig,
        hls_root: Option<PathBuf>,
    ) -> Self {
        Self {
            tuner_slots,
            heartbeat_every: lease_ttl / 2,
            lease_ttl,
            pipeline_stop_timeout,
            owner: owner.into(),
            start_concurrency,
            stop_concurrency,
            lease_key_func: default_lease_key_func(),
            sweeper,
            hls_root,
        }
    }

    pub fn with_lease_key_func(mut self, f: LeaseKeyFunc) -> Self {
        self.lease_key_func = f;
        self
    }

    /// Validate all mandatory fields; any missing/non-positive value is a
    /// fatal config error discovered before any I/O (spec §4.E).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tuner_slots.is_empty() {
            return Err(ConfigError::Empty { field: "tunerSlots" });
        }
        if self.lease_ttl.is_zero() {
            return Err(ConfigError::NotPositive { field: "leaseTTL" });
        }
        if self.heartbeat_every.is_zero() {
            return Err(ConfigError::NotPositive { field: "heartbeatEvery" });
        }
        if self.heartbeat_every >= self.lease_ttl {
            return Err(ConfigError::HeartbeatNotLessThanTtl {
                heartbeat_ms: self.heartbeat_every.as_millis() as u64,
                ttl_ms: self.lease_ttl.as_millis() as u64,
            });
        }
        if self.pipeline_stop_timeout.is_zero() {
            return Err(ConfigError::NotPositive { field: "pipelineStopTimeout" });
        }
        if self.owner.is_empty() {
            return Err(ConfigError::Empty { field: "owner" });
        }
        if self.start_concurrency == 0 {
            return Err(ConfigError::NotPositive { field: "startConcurrency" });
        }
        if self.stop_concurrency == 0 {
            return Err(ConfigError::NotPositive { field: "stopConcurrency" });
        }
        if self.sweeper.interval.is_zero() {
            return Err(ConfigError::NotPositive { field: "sweeper.interval" });
        }
        if self.sweeper.session_retention.is_zero() {
            return Err(ConfigError::NotPositive { field: "sweeper.sessionRetention" });
        }
        if let Some(idle) = self.sweeper.idle_timeout {
            if idle.is_zero() {
                return Err(ConfigError::NotPositive { field: "sweeper.idleTimeout" });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
