// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! xg2g daemon (xg2gd)
//!
//! Long-running process that owns the session orchestrator: it acquires
//! the guard lease, sweeps recovered sessions, and multiplexes tuner slots
//! among concurrent sessions (spec §1, §4.E). Nothing publishes
//! `StartSessionEvent`s into this process yet — the HTTP API surface that
//! would is explicitly out of scope (spec §1) — so today the daemon just
//! sits ready for that future collaborator.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use xg2g_daemon::config::DaemonConfig;
use xg2g_daemon::lifecycle::{self, LifecycleError, Paths};
use xg2g_daemon::{env, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("xg2gd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("xg2gd {}", env!("CARGO_PKG_VERSION"));
                println!("xg2g session daemon");
                println!();
                println!("USAGE:");
                println!("    xg2gd");
                println!();
                println!("The daemon is typically started by the `xg2g` CLI's `serve`");
                println!("subcommand and should not be invoked directly.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: xg2gd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let state_dir = env::state_dir()?;
    let paths = Paths::new(state_dir.clone());
    let config_path = env::config_path(&state_dir);
    let config = DaemonConfig::load(&config_path)?;

    rotate_log_if_needed(&paths.log_path);
    write_startup_marker(&paths)?;
    let log_guard = setup_logging(&paths, &env::log_filter())?;

    info!("starting xg2g daemon");

    let daemon = match lifecycle::startup(&config, paths.clone()).await {
        Ok(d) => d,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&paths.lock_path).unwrap_or_default();
            eprintln!("xg2gd is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&paths, &e);
            error!("failed to start daemon: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown = CancellationToken::new();
    spawn_checkpoint_task(Arc::clone(&daemon.store), shutdown.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let orchestrator = Arc::clone(&daemon.orchestrator);
    let run_token = shutdown.clone();
    let engine = tokio::spawn(async move { orchestrator.run(run_token).await });

    println!("READY");
    info!("daemon ready");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }
    shutdown.cancel();

    match engine.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("orchestrator exited with error: {e}"),
        Err(e) => error!("orchestrator task panicked: {e}"),
    }

    if let Err(e) = daemon.store.checkpoint_and_truncate() {
        error!("final checkpoint failed: {e}");
    }
    daemon.shutdown();
    info!("daemon stopped");
    Ok(())
}

/// Checkpoint interval mirroring the store's own group-commit cadence, run
/// independently of the orchestrator so the WAL never grows unbounded
/// while the daemon is otherwise idle (no sessions active).
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

fn spawn_checkpoint_task(store: Arc<Store>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = store.checkpoint_and_truncate() {
                        tracing::warn!(error = %e, "periodic checkpoint failed");
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log if it exceeds [`MAX_LOG_SIZE`]. Best-effort: a
/// failure here must never prevent the daemon from starting.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

const STARTUP_MARKER_PREFIX: &str = "--- xg2gd: starting (pid: ";

fn write_startup_marker(paths: &Paths) -> Result<(), LifecycleError> {
    use std::io::Write;
    if let Some(parent) = paths.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&paths.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(paths: &Paths, error: &LifecycleError) {
    use std::io::Write;
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&paths.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

fn setup_logging(
    paths: &Paths,
    filter_directive: &str,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = paths.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        paths.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        paths.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
