// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations. Each submodule owns its `clap::Args` struct
//! and a `run` function; `main.rs` only dispatches.

pub mod serve;
pub mod sessions;
pub mod status;
pub mod stop;

use anyhow::Context;
use xg2g_daemon::lifecycle::Paths;
use xg2g_storage::Store;

/// Resolve the daemon's state directory and open its durable store
/// read-only-in-practice: this process never calls a mutating method, so
/// it never appends to the WAL the daemon is concurrently writing (spec
/// §4.D: "readers must not block on writers").
pub fn open_store() -> anyhow::Result<Store> {
    let state_dir = xg2g_daemon::env::state_dir().context("resolving state directory")?;
    let paths = Paths::new(state_dir);
    Store::open(&paths.wal_path, &paths.snapshot_path)
        .with_context(|| format!("opening store at {}", paths.state_dir.display()))
}
