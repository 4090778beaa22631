// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable reason/detail code taxonomy. These are the only vocabulary a
//! session is allowed to surface externally — free-text debug strings never
//! leave this crate's boundary (see `reasonDetailDebug` in spec §3).

use serde::{Deserialize, Serialize};

/// Stable, typed failure/decision label surfaced externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReasonCode {
    None,
    Unknown,
    BadRequest,
    NotFound,
    LeaseBusy,
    TuneTimeout,
    LeaseExpired,
    TuneFailed,
    InvariantViolation,
    PipelineStartFailed,
    ProcessEnded,
    PackagerFailed,
    Cancelled,
    DeadlineExceeded,
    IdleTimeout,
    ClientStop,
    UpstreamCorrupt,
    InternalInvariantBreach,
}

impl Default for ReasonCode {
    fn default() -> Self {
        Self::None
    }
}

/// Public, typed sub-label for a `ReasonCode`. Never free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DetailCode {
    None,
    ContextCanceled,
    DeadlineExceeded,
    RecordingComplete,
    SweeperForcedStopStuck,
    InternalInvariantBreach,
}

impl Default for DetailCode {
    fn default() -> Self {
        Self::None
    }
}

/// Coarse class for callers who want to `match` on category rather than
/// the specific reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    AdmissionRejected,
    NotFound,
    BadRequest,
    PipelineFailure,
    SessionCanceled,
    InvariantViolation,
    Unknown,
}

impl ReasonCode {
    /// Coarse error class used by callers that branch on category rather
    /// than the exact reason.
    pub fn class(self) -> ErrorClass {
        match self {
            ReasonCode::LeaseBusy | ReasonCode::LeaseExpired => ErrorClass::AdmissionRejected,
            ReasonCode::NotFound => ErrorClass::NotFound,
            ReasonCode::BadRequest => ErrorClass::BadRequest,
            ReasonCode::TuneTimeout
            | ReasonCode::TuneFailed
            | ReasonCode::PipelineStartFailed
            | ReasonCode::ProcessEnded
            | ReasonCode::PackagerFailed
            | ReasonCode::UpstreamCorrupt => ErrorClass::PipelineFailure,
            ReasonCode::Cancelled | ReasonCode::ClientStop | ReasonCode::IdleTimeout => {
                ErrorClass::SessionCanceled
            }
            ReasonCode::InvariantViolation | ReasonCode::InternalInvariantBreach => {
                ErrorClass::InvariantViolation
            }
            ReasonCode::None | ReasonCode::Unknown | ReasonCode::DeadlineExceeded => {
                ErrorClass::Unknown
            }
        }
    }
}

/// Strip a debug string down to something safe to log: no newlines,
/// truncated to at most 160 characters with an ellipsis marker.
pub fn sanitize_debug(raw: &str) -> String {
    const MAX_LEN: usize = 160;
    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_LEN {
        collapsed
    } else {
        let truncated: String = collapsed.chars().take(MAX_LEN.saturating_sub(1)).collect();
        format!("{truncated}\u{2026}")
    }
}

#[cfg(test)]
#[path = "reason_tests.rs"]
mod tests;
