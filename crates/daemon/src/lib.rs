// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! xg2g daemon library: state directory resolution, TOML configuration,
//! and the startup sequence that wires the durable store, capability
//! ports, and orchestrator together (spec §4.E). Exposed as a library so
//! the `xg2g` CLI can resolve the same file paths and open the same
//! durable store for read-only inspection, without depending on
//! `xg2g-adapters`/`xg2g-storage` directly (spec §1: no IPC transport
//! exists, so inspection reads the store the daemon itself writes).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;

pub use config::{ConfigError, DaemonConfig};
pub use lifecycle::{startup, Daemon, DaemonOrchestrator, LifecycleError, Paths};

pub use xg2g_core::{Mode, Phase, Profile, SessionId, SessionRecord, SessionState};
pub use xg2g_engine::{Metrics, MetricsSnapshot, OrchestratorConfig};
pub use xg2g_storage::{Store, StoreError};
