// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public store API: sessions, leases, and idempotency keys behind a single
//! writer. Every mutation is an event appended to the WAL and flushed
//! before it is folded into the in-memory `MaterializedState`, so a crash
//! between "appended" and "applied" can never lose a durable fact — replay
//! on the next `Store::open` reconstructs it.
//!
//! Readers take a read-only clone of the relevant record; they never block
//! on an in-flight write (spec §4.D).

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use xg2g_core::{
    DetailCode, IdempotencyRecord, Lease, LeaseKey, Mode, PipelineState, Profile, ReasonCode,
    SessionId, SessionRecord, SessionState,
};

use crate::checkpoint::{load_snapshot, CheckpointError, Checkpointer};
use crate::state::{MaterializedState, StoreEvent};
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("session {0} not found")]
    SessionNotFound(String),
    #[error("session {0} is terminal and cannot be mutated further")]
    SessionTerminal(String),
    #[error("lease {key} not owned by {owner}")]
    LeaseNotOwned { key: String, owner: String },
}

/// Result of a `TryAcquire`/`Renew` call (spec §4.D).
#[derive(Debug, Clone)]
pub enum LeaseOutcome {
    Acquired(Lease),
    /// The key is held by someone else; carries the current holder's
    /// snapshot so the caller can report who.
    Busy(Lease),
}

impl LeaseOutcome {
    pub fn acquired(&self) -> bool {
        matches!(self, LeaseOutcome::Acquired(_))
    }
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    checkpointer: Checkpointer,
}

/// The durable state store: single-writer, serialized through an internal
/// mutex (spec §4.D: "all updates are serialized through a single write
/// transaction").
pub struct Store {
    inner: Mutex<Inner>,
    wal_path: PathBuf,
    snapshot_path: PathBuf,
}

impl Store {
    /// Open the store at `wal_path`/`snapshot_path`, loading the last
    /// snapshot (if any) and replaying WAL entries written after it.
    pub fn open(wal_path: &Path, snapshot_path: &Path) -> Result<Self, StoreError> {
        let (mut state, processed_seq) = match load_snapshot(snapshot_path) {
            Ok(Some(snapshot)) => (snapshot.state, snapshot.seq),
            Ok(None) => (MaterializedState::default(), 0),
            Err(_) => (MaterializedState::default(), 0),
        };

        let wal = Wal::open(wal_path, processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply_event(&entry.event);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                checkpointer: Checkpointer::new(snapshot_path.to_owned()),
            }),
            wal_path: wal_path.to_owned(),
            snapshot_path: snapshot_path.to_owned(),
        })
    }

    fn commit(&self, inner: &mut Inner, event: StoreEvent) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(())
    }

    /// Write a checkpoint of the current state and truncate the WAL up to
    /// the checkpointed sequence. Fsync-before-truncate ordering is
    /// enforced by `Checkpointer`/`CheckpointHandle::wait`.
    pub fn checkpoint_and_truncate(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.processed_seq();
        if seq == 0 {
            return Ok(());
        }
        let result = inner.checkpointer.checkpoint_sync(seq, &inner.state)?;
        inner.wal.truncate_before(result.seq + 1)?;
        Ok(())
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    // ---- sessions -------------------------------------------------------

    pub fn create_session(
        &self,
        session_id: SessionId,
        service_ref: impl Into<String>,
        profile: Profile,
        correlation_id: impl Into<String>,
        mode: Mode,
        now_ms: i64,
    ) -> Result<SessionRecord, StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::SessionCreated {
                session_id: session_id.clone(),
                service_ref: service_ref.into(),
                profile,
                correlation_id: correlation_id.into(),
                mode,
                now_ms,
            },
        )?;
        inner
            .state
            .get_session(session_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.as_str().to_string()))
    }

    pub fn get_session(&self, session_id: &str) -> Option<SessionRecord> {
        self.inner.lock().state.get_session(session_id).cloned()
    }

    pub fn list_sessions(&self) -> Vec<SessionRecord> {
        self.inner.lock().state.sessions.values().cloned().collect()
    }

    /// Transition a session's public state. Enforces invariant 1 (terminal
    /// is absorbing): once terminal, only an identical re-write is
    /// accepted (idempotent replay), everything else is rejected.
    pub fn update_session_state(
        &self,
        session_id: &str,
        state: SessionState,
        reason: ReasonCode,
        detail: DetailCode,
        reason_detail_debug: Option<String>,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let current = inner
            .state
            .get_session(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        if current.is_terminal() && current.state != state {
            return Err(StoreError::SessionTerminal(session_id.to_string()));
        }

        self.commit(
            &mut inner,
            StoreEvent::SessionStateChanged {
                session_id: SessionId::new(session_id),
                state,
                reason,
                detail,
                reason_detail_debug,
                now_ms,
            },
        )
    }

    pub fn set_pipeline_state(
        &self,
        session_id: &str,
        pipeline_state: PipelineState,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_session(session_id).is_none() {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        self.commit(
            &mut inner,
            StoreEvent::SessionPipelineStateChanged {
                session_id: SessionId::new(session_id),
                pipeline_state,
                now_ms,
            },
        )
    }

    pub fn set_context(
        &self,
        session_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_session(session_id).is_none() {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        self.commit(
            &mut inner,
            StoreEvent::SessionContextSet {
                session_id: SessionId::new(session_id),
                key: key.into(),
                value: value.into(),
                now_ms,
            },
        )
    }

    pub fn touch_session(&self, session_id: &str, now_ms: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_session(session_id).is_none() {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        self.commit(
            &mut inner,
            StoreEvent::SessionTouched {
                session_id: SessionId::new(session_id),
                now_ms,
            },
        )
    }

    pub fn mark_playlist_published(&self, session_id: &str, now_ms: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_session(session_id).is_none() {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        self.commit(
            &mut inner,
            StoreEvent::SessionPlaylistPublished {
                session_id: SessionId::new(session_id),
                now_ms,
            },
        )
    }

    pub fn mark_segment_observed(&self, session_id: &str, now_ms: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get_session(session_id).is_none() {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        self.commit(
            &mut inner,
            StoreEvent::SessionSegmentObserved {
                session_id: SessionId::new(session_id),
                now_ms,
            },
        )
    }

    pub fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::SessionDeleted {
                session_id: SessionId::new(session_id),
            },
        )
    }

    // ---- leases -----------------------------------------------------------

    /// Atomic: if no unexpired row exists, or the existing row is already
    /// owned by `owner`, write `(key, owner, now+ttl)` and report acquired.
    /// Otherwise report the current holder's snapshot (busy).
    pub fn try_acquire_lease(
        &self,
        key: &LeaseKey,
        owner: &str,
        ttl_ms: i64,
        now_ms: i64,
    ) -> Result<LeaseOutcome, StoreError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.state.lease(key) {
            if !existing.is_expired(now_ms) && existing.owner != owner {
                return Ok(LeaseOutcome::Busy(existing.clone()));
            }
        }
        let lease = Lease::new(key.clone(), owner, now_ms + ttl_ms);
        self.commit(&mut inner, StoreEvent::LeaseWritten { lease: lease.clone() })?;
        Ok(LeaseOutcome::Acquired(lease))
    }

    /// Renew a lease. Fail-closed: if the current row is expired or owned
    /// by someone else, this is an error — the caller must treat the lease
    /// as lost, never silently resurrect an expired lease.
    pub fn renew_lease(
        &self,
        key: &LeaseKey,
        owner: &str,
        ttl_ms: i64,
        now_ms: i64,
    ) -> Result<Lease, StoreError> {
        let mut inner = self.inner.lock();
        match inner.state.lease(key) {
            Some(existing) if existing.owner == owner && !existing.is_expired(now_ms) => {
                let lease = Lease::new(key.clone(), owner, now_ms + ttl_ms);
                self.commit(&mut inner, StoreEvent::LeaseWritten { lease: lease.clone() })?;
                Ok(lease)
            }
            _ => Err(StoreError::LeaseNotOwned {
                key: key.as_str().to_string(),
                owner: owner.to_string(),
            }),
        }
    }

    /// Delete a lease only if `owner` matches the current holder.
    pub fn release_lease(&self, key: &LeaseKey, owner: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::LeaseReleased {
                key: key.clone(),
                owner: owner.to_string(),
            },
        )
    }

    pub fn get_lease(&self, key: &LeaseKey) -> Option<Lease> {
        self.inner.lock().state.lease(key).cloned()
    }

    /// Wipe every lease. Only safe immediately after the guard lease is
    /// (re-)acquired at startup (spec §4.E step 3).
    pub fn delete_all_leases(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::LeaseDeletedAll)
    }

    // ---- idempotency --------------------------------------------------

    pub fn get_idempotent_session(&self, key: &str, now_ms: i64) -> Option<SessionId> {
        let inner = self.inner.lock();
        inner
            .state
            .idempotency(key)
            .filter(|r| !r.is_expired(now_ms))
            .map(|r| r.session_id.clone())
    }

    pub fn put_idempotent(
        &self,
        key: impl Into<String>,
        session_id: SessionId,
        expires_at_ms: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::IdempotencyPut {
                record: IdempotencyRecord::new(key, session_id, expires_at_ms),
            },
        )
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
