// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payloads carried on the two bus topics the orchestrator consumes
//! (spec §6).

use std::sync::Arc;

use xg2g_core::SessionId;

/// `{sessionId, serviceRef, profileId, correlationId}` (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSessionEvent {
    pub session_id: SessionId,
    pub service_ref: String,
    pub profile_id: String,
    pub correlation_id: String,
}

/// `{sessionId, reason}` (spec §6). `reason` is a free-form tag the sweeper
/// and API collaborator use to distinguish `IdleTimeout` stops from plain
/// client stops; it is not the `ReasonCode` surfaced on the session itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSessionEvent {
    pub session_id: SessionId,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ClientStop,
    IdleTimeout,
}

/// The single event type carried by both bus topics (spec §4.H: the bus
/// port is generic over its event type; the orchestrator fixes it to this
/// enum and routes `Start`/`Stop` to the matching topic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Start(StartSessionEvent),
    Stop(StopSessionEvent),
}

/// Pure function from a `StartSessionEvent` to its dedup-lease key (spec
/// §4.E `leaseKeyFunc`). Default: `service:<serviceRef>`.
pub type LeaseKeyFunc = Arc<dyn Fn(&StartSessionEvent) -> xg2g_core::LeaseKey + Send + Sync>;

pub fn default_lease_key_func() -> LeaseKeyFunc {
    Arc::new(|event: &StartSessionEvent| xg2g_core::LeaseKey::service(&event.service_ref))
}
