// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the engine surfaces to its caller: sentinel startup errors the
//! supervisor matches on (spec §6), and the fatal conditions that bubble out
//! of the orchestrator's `run()` loop (spec §7 "fatal vs local").

use thiserror::Error;

use xg2g_storage::StoreError;

/// One sentinel per stop class the supervising process is expected to
/// translate into an exit code (spec §6). Construction-time config errors
/// are reported separately via [`ConfigError`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    #[error("manager not started")]
    ManagerNotStarted,
    #[error("missing logger")]
    MissingLogger,
    #[error("missing API handler")]
    MissingAPIHandler,
    #[error("missing media pipeline")]
    MissingMediaPipeline,
    #[error("missing orchestrator factory")]
    MissingOrchestratorFactory,
}

/// A fatal field validation failure discovered before any I/O (spec §4.E).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be non-empty")]
    Empty { field: &'static str },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("heartbeatEvery ({heartbeat_ms}ms) must be less than leaseTTL ({ttl_ms}ms)")]
    HeartbeatNotLessThanTtl { heartbeat_ms: u64, ttl_ms: u64 },
}

/// Fatal errors that stop the orchestrator's run loop entirely (spec §7):
/// guard lease loss, config invalidity, and store corruption. Everything
/// else is session-local and handled by finalization instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration invalid: {0}")]
    Config(#[from] ConfigError),
    #[error("guard lease lost or never acquired (another owner: {holder})")]
    GuardLost { holder: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
