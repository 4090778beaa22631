// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from the event log.
//!
//! This is the event-sourcing approach where state is derived from events:
//! events are facts about what happened, state is the current projection of
//! those facts. Three logical tables, per spec §6: `sessions`, `leases`,
//! `idempotency`.
//!
//! # Idempotency requirement
//!
//! **Every `apply_event` arm must be idempotent.** Applying the same event
//! twice must produce the same state as applying it once, because replay
//! after a crash re-applies entries the in-memory state may already
//! reflect. Guidelines: use assignment, not accumulation; guard deletions
//! and insertions with existence checks; never derive a value from "this
//! event's occurrence count".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use xg2g_core::{
    DetailCode, IdempotencyRecord, Lease, LeaseKey, Mode, PipelineState, Profile, ReasonCode,
    SessionId, SessionRecord, SessionState,
};

/// A single durable fact. The WAL stores a sequence of these; `apply_event`
/// folds them into a `MaterializedState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    SessionCreated {
        session_id: SessionId,
        service_ref: String,
        profile: Profile,
        correlation_id: String,
        mode: Mode,
        now_ms: i64,
    },
    SessionStateChanged {
        session_id: SessionId,
        state: SessionState,
        reason: ReasonCode,
        detail: DetailCode,
        reason_detail_debug: Option<String>,
        now_ms: i64,
    },
    SessionPipelineStateChanged {
        session_id: SessionId,
        pipeline_state: PipelineState,
        now_ms: i64,
    },
    SessionContextSet {
        session_id: SessionId,
        key: String,
        value: String,
        now_ms: i64,
    },
    SessionTouched {
        session_id: SessionId,
        now_ms: i64,
    },
    SessionPlaylistPublished {
        session_id: SessionId,
        now_ms: i64,
    },
    SessionSegmentObserved {
        session_id: SessionId,
        now_ms: i64,
    },
    SessionDeleted {
        session_id: SessionId,
    },
    LeaseWritten {
        lease: Lease,
    },
    LeaseReleased {
        key: LeaseKey,
        owner: String,
    },
    LeaseDeletedAll,
    IdempotencyPut {
        record: IdempotencyRecord,
    },
    IdempotencyDeleted {
        key: String,
    },
}

/// Materialized projection of the event log. This is what `Store` hands
/// callers read access to, and what `Checkpointer` serializes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<String, SessionRecord>,
    pub leases: HashMap<String, Lease>,
    pub idempotency: HashMap<String, IdempotencyRecord>,
}

impl MaterializedState {
    pub fn get_session(&self, id: &str) -> Option<&SessionRecord> {
        self.sessions.get(id)
    }

    pub fn lease(&self, key: &LeaseKey) -> Option<&Lease> {
        self.leases.get(key.as_str())
    }

    /// Live (non-expired) lease for a key, or `None`.
    pub fn live_lease(&self, key: &LeaseKey, now_ms: i64) -> Option<&Lease> {
        self.lease(key).filter(|l| !l.is_expired(now_ms))
    }

    pub fn idempotency(&self, key: &str) -> Option<&IdempotencyRecord> {
        self.idempotency.get(key)
    }

    /// Apply a single durable event, mutating the projection in place.
    /// Must be idempotent (see module docs).
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::SessionCreated {
                session_id,
                service_ref,
                profile,
                correlation_id,
                mode,
                now_ms,
            } => {
                // Idempotent: only seed the record if it doesn't exist yet.
                self.sessions.entry(session_id.as_str().to_string()).or_insert_with(|| {
                    SessionRecord::new(
                        session_id.clone(),
                        service_ref.clone(),
                        profile.clone(),
                        correlation_id.clone(),
                        *mode,
                        *now_ms,
                    )
                });
            }
            StoreEvent::SessionStateChanged {
                session_id,
                state,
                reason,
                detail,
                reason_detail_debug,
                now_ms,
            } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.state = *state;
                    record.reason = *reason;
                    record.reason_detail_code = *detail;
                    record.reason_detail_debug = reason_detail_debug.clone();
                    record.updated_at_ms = *now_ms;
                }
            }
            StoreEvent::SessionPipelineStateChanged {
                session_id,
                pipeline_state,
                now_ms,
            } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.pipeline_state = *pipeline_state;
                    record.updated_at_ms = *now_ms;
                }
            }
            StoreEvent::SessionContextSet {
                session_id,
                key,
                value,
                now_ms,
            } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.context_data.set(key.clone(), value.clone());
                    record.updated_at_ms = *now_ms;
                }
            }
            StoreEvent::SessionTouched { session_id, now_ms } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.touch(*now_ms);
                }
            }
            StoreEvent::SessionPlaylistPublished { session_id, now_ms } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.playlist_published_at_ms = Some(*now_ms);
                    record.last_access_at_ms = Some(*now_ms);
                    record.updated_at_ms = *now_ms;
                }
            }
            StoreEvent::SessionSegmentObserved { session_id, now_ms } => {
                if let Some(record) = self.sessions.get_mut(session_id.as_str()) {
                    record.latest_segment_at_ms = Some(*now_ms);
                }
            }
            StoreEvent::SessionDeleted { session_id } => {
                self.sessions.remove(session_id.as_str());
            }
            StoreEvent::LeaseWritten { lease } => {
                self.leases.insert(lease.key.as_str().to_string(), lease.clone());
            }
            StoreEvent::LeaseReleased { key, owner } => {
                // Idempotent: only remove if the owner still matches (a stale
                // release replayed after a new owner acquired must not evict it).
                if let Some(existing) = self.leases.get(key.as_str()) {
                    if existing.owner == *owner {
                        self.leases.remove(key.as_str());
                    }
                }
            }
            StoreEvent::LeaseDeletedAll => {
                self.leases.clear();
            }
            StoreEvent::IdempotencyPut { record } => {
                self.idempotency
                    .entry(record.key.clone())
                    .or_insert_with(|| record.clone());
            }
            StoreEvent::IdempotencyDeleted { key } => {
                self.idempotency.remove(key);
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
