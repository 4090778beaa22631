// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable state store for the tuner session orchestrator: sessions,
//! leases, and idempotency keys (spec §4.A), backed by a JSONL
//! write-ahead log with periodic zstd-compressed checkpoints.

mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{
    CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter, Checkpointer,
    FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationHistoryRecord, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{MaterializedState, StoreEvent};
pub use store::{LeaseOutcome, Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
