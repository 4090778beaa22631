// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: single-instance guarding, durable state recovery, and
//! wiring of the capability ports the orchestrator consumes. Everything
//! past `startup()` — guard lease acquisition, the recovery sweep, and the
//! event loop — is the orchestrator's own job (spec §4.E); this module's
//! only responsibility is building the `Arc<Orchestrator>` and handing it
//! the process identity.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tracing::info;

use xg2g_adapters::{InMemoryBus, OsPlatform, Platform, SubprocessPipeline, TracedPipeline};
use xg2g_core::SystemClock;
use xg2g_engine::{Orchestrator, OrchestratorError, SessionEvent};
use xg2g_storage::{Store, StoreError};

use crate::config::DaemonConfig;

/// Concrete orchestrator type this daemon runs: the real clock and the
/// in-process event bus (spec §1: "only the in-process port is
/// implemented").
pub type DaemonOrchestrator = Orchestrator<SystemClock, InMemoryBus<SessionEvent>>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire daemon lock: another instance already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed file layout under the resolved state directory.
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("daemon.pid"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
        }
    }
}

/// A fully wired, not-yet-running daemon: the durable store, the bus the
/// orchestrator publishes/subscribes on, and the orchestrator itself. The
/// exclusive lock file is held for as long as this value lives.
pub struct Daemon {
    pub paths: Paths,
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<Store>,
    pub bus: Arc<InMemoryBus<SessionEvent>>,
    pub orchestrator: Arc<DaemonOrchestrator>,
}

impl Daemon {
    /// Release the single-instance lock by dropping the held file handle.
    /// The orchestrator's own guard lease (a row in the durable store) is
    /// separate and is relinquished by the recovery sweep of whichever
    /// process acquires it next.
    pub fn shutdown(self) {
        info!("daemon lifecycle shutdown complete");
    }
}

/// Acquire the single-instance lock, open the durable store, and build the
/// orchestrator ready to `run()`. Cleans up any files it created if a later
/// step fails; a failure to acquire the lock itself leaves everything
/// untouched, since those files belong to the already-running daemon.
pub async fn startup(config: &DaemonConfig, paths: Paths) -> Result<Daemon, LifecycleError> {
    match startup_inner(config, &paths).await {
        Ok(daemon) => Ok(daemon),
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(&paths);
            Err(e)
        }
    }
}

async fn startup_inner(config: &DaemonConfig, paths: &Paths) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;
    if let Some(parent) = paths.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Acquire the lock before touching the PID contents it protects, so a
    // losing process never truncates the winner's file out from under it.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    let store = Arc::new(Store::open(&paths.wal_path, &paths.snapshot_path)?);
    let bus = Arc::new(InMemoryBus::new());

    let platform: Arc<dyn Platform> = Arc::new(OsPlatform::new(
        config.hls_root.clone().unwrap_or_else(|| paths.state_dir.join("hls")),
    ));
    let owner = platform.identity();

    let pipeline: Arc<dyn xg2g_adapters::MediaPipeline> = Arc::new(TracedPipeline::new(SubprocessPipeline::new(
        config.pipeline_binary.clone(),
        config.allowed_url_prefixes.clone(),
    )));

    let metrics = Arc::new(xg2g_engine::Metrics::new());
    let orchestrator_config = config.to_orchestrator_config(owner);

    let orchestrator = Orchestrator::new(
        orchestrator_config,
        Arc::clone(&store),
        SystemClock,
        Arc::clone(&bus),
        pipeline,
        platform,
        metrics,
    )?;

    info!(state_dir = %paths.state_dir.display(), "daemon lifecycle initialized");

    Ok(Daemon { paths: paths.clone(), lock_file, store, bus, orchestrator })
}

fn cleanup_on_failure(paths: &Paths) {
    if paths.lock_path.exists() {
        let _ = std::fs::remove_file(&paths.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
