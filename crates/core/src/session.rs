// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session data model: the unit of work the orchestrator drives through its
//! lifecycle. See spec §3 for the authoritative field list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::lifecycle::{PipelineState, SessionState};
use crate::reason::{DetailCode, ReasonCode};

define_id! {
    /// Opaque session identifier. Grammar is ASCII alphanumerics, `-`, `_`.
    pub struct SessionId;
}

const ID_GRAMMAR: &str = "ASCII letters, digits, '-', '_'";

impl SessionId {
    /// Parse a raw string into a `SessionId`, enforcing the safe-id grammar
    /// (no path separators, no control characters — this id is used to
    /// build filesystem paths under `hlsRoot`).
    pub fn parse(raw: &str) -> Result<Self, InvalidSessionId> {
        if raw.is_empty() {
            return Err(InvalidSessionId {
                raw: raw.to_string(),
                reason: "empty",
            });
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(InvalidSessionId {
                raw: raw.to_string(),
                reason: ID_GRAMMAR,
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Whether this id is safe to use as a single path component. Used by
    /// the sweeper's file scan to validate directory names it encounters.
    pub fn is_safe_session_id(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSessionId {
    pub raw: String,
    pub reason: &'static str,
}

impl std::fmt::Display for InvalidSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid session id {:?}: {}", self.raw, self.reason)
    }
}

impl std::error::Error for InvalidSessionId {}

/// Playback mode. Determines which leases a session takes (LIVE takes both
/// dedup and tuner leases; RECORDING's upstream source is not a scarce
/// shared tuner in the same sense, but still occupies a slot while active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Live,
    Recording,
}

/// Pipeline configuration: codec/quality/DVR window/VOD flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub codec: String,
    pub quality: String,
    /// DVR window in seconds, for live sessions; irrelevant for VOD.
    pub dvr_window_secs: u32,
    pub is_vod: bool,
}

/// Small mapping of scalar strings attached to a session. Must include
/// `tuner_slot` whenever a tuner-slot lease is held (spec §3 invariant 2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextData(BTreeMap<String, String>);

pub const KEY_TUNER_SLOT: &str = "tuner_slot";
pub const KEY_MODE: &str = "mode";
pub const KEY_RECOVERED: &str = "recovered";
pub const KEY_RECOVERED_FROM: &str = "recovered_from";
/// The `StopReason` a pending stop request carried in, so finalization can
/// surface `IdleTimeout` rather than assuming every stop came from a client.
pub const KEY_STOP_REASON: &str = "stop_reason";
pub const STOP_REASON_IDLE_TIMEOUT: &str = "IDLE_TIMEOUT";
pub const STOP_REASON_CLIENT_STOP: &str = "CLIENT_STOP";

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn tuner_slot(&self) -> Option<&str> {
        self.get(KEY_TUNER_SLOT)
    }

    pub fn set_tuner_slot(&mut self, slot: impl std::fmt::Display) {
        self.set(KEY_TUNER_SLOT, slot.to_string());
    }

    pub fn mark_recovered(&mut self, from_state: SessionState) {
        self.set(KEY_RECOVERED, "true");
        self.set(KEY_RECOVERED_FROM, from_state.as_str());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The session is the unit of work; identified by an opaque safe id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub state: SessionState,
    pub pipeline_state: PipelineState,
    pub reason: ReasonCode,
    pub reason_detail_code: DetailCode,
    /// Free text, never surfaced publicly.
    pub reason_detail_debug: Option<String>,
    pub service_ref: String,
    pub profile: Profile,
    pub correlation_id: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub expires_at_ms: Option<i64>,
    pub lease_expires_at_ms: Option<i64>,
    pub last_access_at_ms: Option<i64>,
    pub playlist_published_at_ms: Option<i64>,
    pub latest_segment_at_ms: Option<i64>,
    pub context_data: ContextData,
}

impl SessionRecord {
    pub fn new(
        session_id: SessionId,
        service_ref: impl Into<String>,
        profile: Profile,
        correlation_id: impl Into<String>,
        mode: Mode,
        now_ms: i64,
    ) -> Self {
        let mut context_data = ContextData::new();
        context_data.set(
            KEY_MODE,
            match mode {
                Mode::Live => "LIVE",
                Mode::Recording => "RECORDING",
            },
        );
        Self {
            session_id,
            state: SessionState::New,
            pipeline_state: PipelineState::Init,
            reason: ReasonCode::None,
            reason_detail_code: DetailCode::None,
            reason_detail_debug: None,
            service_ref: service_ref.into(),
            profile,
            correlation_id: correlation_id.into(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            expires_at_ms: None,
            lease_expires_at_ms: None,
            last_access_at_ms: None,
            playlist_published_at_ms: None,
            latest_segment_at_ms: None,
            context_data,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        match self.context_data.get(KEY_MODE) {
            Some("LIVE") => Some(Mode::Live),
            Some("RECORDING") => Some(Mode::Recording),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `(state, reason, detailCode)` as surfaced to external callers.
    /// Debug text never appears here.
    pub fn public_view(&self) -> (SessionState, ReasonCode, DetailCode) {
        (self.state, self.reason, self.reason_detail_code)
    }

    /// Touch `updated_at_ms` and `last_access_at_ms` to `now_ms`.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at_ms = now_ms;
        self.last_access_at_ms = Some(now_ms);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
