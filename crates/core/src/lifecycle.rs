// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session state machine. `decision_for` is a total function over
//! (state, event); `terminal_outcome` is the separate resolver that turns a
//! (stopIntent, phase, cause) triple into a concrete terminal state +
//! reason + detail at finalization time. See spec §4.B.

use serde::{Deserialize, Serialize};

use crate::reason::{DetailCode, ReasonCode};

/// Session lifecycle state. Terminal = {Failed, Cancelled, Stopped}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SessionState {
    Unknown,
    New,
    Starting,
    Priming,
    Ready,
    Draining,
    Stopping,
    Failed,
    Cancelled,
    Stopped,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Failed | SessionState::Cancelled | SessionState::Stopped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Unknown => "UNKNOWN",
            SessionState::New => "NEW",
            SessionState::Starting => "STARTING",
            SessionState::Priming => "PRIMING",
            SessionState::Ready => "READY",
            SessionState::Draining => "DRAINING",
            SessionState::Stopping => "STOPPING",
            SessionState::Failed => "FAILED",
            SessionState::Cancelled => "CANCELLED",
            SessionState::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal pipeline phase, tracked alongside `SessionState` but driven by
/// the orchestrator's interaction with the media-pipeline port rather than
/// by `decision_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    Init,
    LeaseAcquired,
    Tuned,
    PackagerReady,
    Serving,
    Fail,
    StopRequested,
    Stopped,
}

/// Events the lifecycle engine consumes. `Terminalize` is never looked up in
/// the transition table — it is resolved by `terminal_outcome` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LifecycleEvent {
    StartRequested,
    PrimingStarted,
    Ready,
    DrainRequested,
    StopRequested,
    LeaseExpired,
    SweeperForcedStop,
    RecoveryReset,
    RecoveryFail,
    Terminalize,
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    TerminalAbsorbing,
    OutOfOrder,
    AlreadyInState,
    RequiresStart,
    RequiresReady,
}

/// A concrete, applied state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub event: LifecycleEvent,
}

/// Outcome of consulting the transition table for a (state, event) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Transition),
    Forbidden(ForbiddenReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

/// A total function over (currentState, eventKind). Every pair has an
/// explicit decision; an absent pair is a bug, so this match is exhaustive
/// over both enums rather than falling back to a wildcard arm.
pub fn decision_for(state: SessionState, event: LifecycleEvent) -> Decision {
    use SessionState as S;

    if state.is_terminal() {
        return Decision::Forbidden(ForbiddenReason::TerminalAbsorbing);
    }

    let allow = |to: SessionState| Decision::Allowed(Transition { from: state, to, event });
    let forbid = |reason: ForbiddenReason| Decision::Forbidden(reason);

    match event {
        LifecycleEvent::StartRequested => match state {
            S::New => allow(S::Starting),
            S::Starting | S::Priming | S::Ready | S::Draining | S::Stopping => {
                forbid(ForbiddenReason::AlreadyInState)
            }
            S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::PrimingStarted => match state {
            S::Starting => allow(S::Priming),
            S::New => forbid(ForbiddenReason::RequiresStart),
            S::Priming => forbid(ForbiddenReason::AlreadyInState),
            S::Ready | S::Draining | S::Stopping | S::Unknown => {
                forbid(ForbiddenReason::OutOfOrder)
            }
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::Ready => match state {
            S::Priming => allow(S::Ready),
            S::New | S::Starting => forbid(ForbiddenReason::RequiresStart),
            S::Ready => forbid(ForbiddenReason::AlreadyInState),
            S::Draining | S::Stopping | S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::DrainRequested => match state {
            S::Ready => allow(S::Draining),
            S::New | S::Starting | S::Priming => forbid(ForbiddenReason::RequiresReady),
            S::Draining => forbid(ForbiddenReason::AlreadyInState),
            S::Stopping | S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::StopRequested => match state {
            S::New | S::Starting | S::Priming | S::Ready | S::Draining => allow(S::Stopping),
            S::Stopping => forbid(ForbiddenReason::AlreadyInState),
            S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::LeaseExpired | LifecycleEvent::SweeperForcedStop => match state {
            S::New | S::Starting | S::Priming | S::Ready | S::Draining | S::Stopping => {
                allow(S::Stopped)
            }
            S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::RecoveryReset => match state {
            S::Starting => allow(S::New),
            S::New | S::Priming | S::Ready | S::Draining | S::Stopping | S::Unknown => {
                forbid(ForbiddenReason::OutOfOrder)
            }
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::RecoveryFail => match state {
            S::Priming | S::Stopping | S::Draining | S::Ready => allow(S::Failed),
            S::New | S::Starting | S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
        LifecycleEvent::Terminalize => match state {
            // Resolved by `terminal_outcome`, not this table; the concrete
            // target state is filled in by the caller after resolution.
            S::New | S::Starting | S::Priming | S::Ready | S::Draining | S::Stopping => {
                allow(state)
            }
            S::Unknown => forbid(ForbiddenReason::OutOfOrder),
            S::Failed | S::Cancelled | S::Stopped => unreachable!("terminal handled above"),
        },
    }
}

/// Coarse classification of where a session sits in its start/run/teardown
/// arc; used by `terminal_outcome` to disambiguate deadline and
/// clean-completion causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    Start,
    Running,
    Teardown,
    VODComplete,
}

/// Whether an explicit client stop was requested. `stopIntent` always wins
/// over any other finalization cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopIntent {
    None,
    Requested,
}

impl StopIntent {
    pub fn is_requested(self) -> bool {
        matches!(self, StopIntent::Requested)
    }
}

impl From<bool> for StopIntent {
    fn from(value: bool) -> Self {
        if value {
            StopIntent::Requested
        } else {
            StopIntent::None
        }
    }
}

/// The reason a handler's return is being finalized, prior to the
/// stopIntent/phase resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    CleanCompletion,
    ContextCancelled,
    DeadlineExceeded,
    /// Already run through the §4.C classifier: carries its reason, public
    /// detail code, and the sanitized debug string the classifier produced
    /// (spec §3's `reasonDetailDebug`, never surfaced publicly).
    Classified(ReasonCode, DetailCode, Option<String>),
}

/// The canonical mapping from (stopIntent, phase, cause) to
/// (state, reason, detail) at finalization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutcome {
    pub state: SessionState,
    pub reason: ReasonCode,
    pub detail: DetailCode,
    pub detail_debug: Option<String>,
}

/// Resolve the final (state, reason, detail) for a session being
/// finalized. `stopIntent` always wins, surfacing `stop_reason` (the
/// `StopReason` the stop request itself carried, e.g. an idle-timeout
/// sweep vs. a client's own stop) rather than a hardcoded `ClientStop`;
/// see spec §4.B.
pub fn terminal_outcome(
    stop_intent: StopIntent,
    stop_reason: ReasonCode,
    phase: Phase,
    cause: Cause,
) -> TerminalOutcome {
    if stop_intent.is_requested() {
        return TerminalOutcome {
            state: SessionState::Stopped,
            reason: stop_reason,
            detail: DetailCode::None,
            detail_debug: None,
        };
    }

    match cause {
        Cause::CleanCompletion if phase == Phase::VODComplete => TerminalOutcome {
            state: SessionState::Draining,
            reason: ReasonCode::None,
            detail: DetailCode::RecordingComplete,
            detail_debug: None,
        },
        Cause::CleanCompletion => TerminalOutcome {
            state: SessionState::Failed,
            reason: ReasonCode::ProcessEnded,
            detail: DetailCode::None,
            detail_debug: None,
        },
        Cause::ContextCancelled => TerminalOutcome {
            state: SessionState::Cancelled,
            reason: ReasonCode::Cancelled,
            detail: DetailCode::ContextCanceled,
            detail_debug: None,
        },
        Cause::DeadlineExceeded if phase == Phase::Start => TerminalOutcome {
            state: SessionState::Failed,
            reason: ReasonCode::TuneTimeout,
            detail: DetailCode::DeadlineExceeded,
            detail_debug: None,
        },
        Cause::DeadlineExceeded => TerminalOutcome {
            state: SessionState::Failed,
            reason: ReasonCode::DeadlineExceeded,
            detail: DetailCode::DeadlineExceeded,
            detail_debug: None,
        },
        Cause::Classified(reason, detail, debug) => TerminalOutcome {
            state: state_for_classified_reason(reason),
            reason,
            detail,
            detail_debug: debug,
        },
    }
}

fn state_for_classified_reason(reason: ReasonCode) -> SessionState {
    match reason {
        ReasonCode::ClientStop => SessionState::Stopped,
        ReasonCode::Cancelled => SessionState::Cancelled,
        _ => SessionState::Failed,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
