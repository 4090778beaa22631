use super::*;

const ALL_STATES: [SessionState; 10] = [
    SessionState::Unknown,
    SessionState::New,
    SessionState::Starting,
    SessionState::Priming,
    SessionState::Ready,
    SessionState::Draining,
    SessionState::Stopping,
    SessionState::Failed,
    SessionState::Cancelled,
    SessionState::Stopped,
];

const ALL_EVENTS: [LifecycleEvent; 10] = [
    LifecycleEvent::StartRequested,
    LifecycleEvent::PrimingStarted,
    LifecycleEvent::Ready,
    LifecycleEvent::DrainRequested,
    LifecycleEvent::StopRequested,
    LifecycleEvent::LeaseExpired,
    LifecycleEvent::SweeperForcedStop,
    LifecycleEvent::RecoveryReset,
    LifecycleEvent::RecoveryFail,
    LifecycleEvent::Terminalize,
];

#[test]
fn every_pair_has_a_decision_and_allowed_implies_a_transition() {
    for &state in &ALL_STATES {
        for &event in &ALL_EVENTS {
            match decision_for(state, event) {
                Decision::Allowed(t) => {
                    assert_eq!(t.from, state);
                    assert_eq!(t.event, event);
                }
                Decision::Forbidden(_) => {}
            }
        }
    }
}

#[test]
fn terminal_states_absorb_every_event() {
    for &state in &[SessionState::Failed, SessionState::Cancelled, SessionState::Stopped] {
        for &event in &ALL_EVENTS {
            assert_eq!(
                decision_for(state, event),
                Decision::Forbidden(ForbiddenReason::TerminalAbsorbing),
                "state {state:?} event {event:?} should absorb"
            );
        }
    }
}

#[test]
fn happy_path_start_to_ready() {
    assert!(decision_for(SessionState::New, LifecycleEvent::StartRequested).is_allowed());
    assert!(decision_for(SessionState::Starting, LifecycleEvent::PrimingStarted).is_allowed());
    assert!(decision_for(SessionState::Priming, LifecycleEvent::Ready).is_allowed());
    assert!(decision_for(SessionState::Ready, LifecycleEvent::DrainRequested).is_allowed());
}

#[yare::parameterized(
    start_new_to_starting = { SessionState::New, LifecycleEvent::StartRequested, Some(SessionState::Starting) },
    priming_starting_to_priming = { SessionState::Starting, LifecycleEvent::PrimingStarted, Some(SessionState::Priming) },
    ready_priming_to_ready = { SessionState::Priming, LifecycleEvent::Ready, Some(SessionState::Ready) },
    drain_ready_to_draining = { SessionState::Ready, LifecycleEvent::DrainRequested, Some(SessionState::Draining) },
    lease_expired_from_ready_to_stopped = { SessionState::Ready, LifecycleEvent::LeaseExpired, Some(SessionState::Stopped) },
    sweeper_forced_stop_from_priming_to_stopped = { SessionState::Priming, LifecycleEvent::SweeperForcedStop, Some(SessionState::Stopped) },
    recovery_fail_from_priming_to_failed = { SessionState::Priming, LifecycleEvent::RecoveryFail, Some(SessionState::Failed) },
    recovery_fail_from_stopping_to_failed = { SessionState::Stopping, LifecycleEvent::RecoveryFail, Some(SessionState::Failed) },
    start_requested_already_starting_is_forbidden = { SessionState::Starting, LifecycleEvent::StartRequested, None },
    priming_started_from_new_requires_start = { SessionState::New, LifecycleEvent::PrimingStarted, None },
    ready_from_unknown_is_out_of_order = { SessionState::Unknown, LifecycleEvent::Ready, None },
)]
fn transition_table_abridged_cases_match_spec(state: SessionState, event: LifecycleEvent, expected_to: Option<SessionState>) {
    match (decision_for(state, event), expected_to) {
        (Decision::Allowed(t), Some(to)) => assert_eq!(t.to, to),
        (Decision::Forbidden(_), None) => {}
        (decision, expected) => panic!("unexpected decision {decision:?} for ({state:?}, {event:?}), expected_to={expected:?}"),
    }
}

#[test]
fn stop_requested_allowed_from_any_non_terminal_state() {
    for &state in &[
        SessionState::New,
        SessionState::Starting,
        SessionState::Priming,
        SessionState::Ready,
        SessionState::Draining,
    ] {
        let decision = decision_for(state, LifecycleEvent::StopRequested);
        assert!(decision.is_allowed(), "expected allowed for {state:?}");
    }
}

#[test]
fn recovery_reset_only_from_starting() {
    assert_eq!(
        decision_for(SessionState::Starting, LifecycleEvent::RecoveryReset),
        Decision::Allowed(Transition {
            from: SessionState::Starting,
            to: SessionState::New,
            event: LifecycleEvent::RecoveryReset,
        })
    );
    assert_eq!(
        decision_for(SessionState::Priming, LifecycleEvent::RecoveryReset),
        Decision::Forbidden(ForbiddenReason::OutOfOrder)
    );
}

#[test]
fn terminal_outcome_stop_intent_always_wins() {
    for &phase in &[Phase::Start, Phase::Running, Phase::Teardown, Phase::VODComplete] {
        let causes = [
            Cause::CleanCompletion,
            Cause::ContextCancelled,
            Cause::DeadlineExceeded,
            Cause::Classified(ReasonCode::TuneFailed, DetailCode::None, None),
        ];
        for cause in &causes {
            for &stop_reason in &[ReasonCode::ClientStop, ReasonCode::IdleTimeout] {
                let outcome = terminal_outcome(StopIntent::Requested, stop_reason, phase, cause.clone());
                assert_eq!(outcome.state, SessionState::Stopped);
                assert_eq!(outcome.reason, stop_reason);
                assert_eq!(outcome.detail, DetailCode::None);
            }
        }
    }
}

#[test]
fn terminal_outcome_clean_completion_vod_drains() {
    let outcome = terminal_outcome(StopIntent::None, ReasonCode::ClientStop, Phase::VODComplete, Cause::CleanCompletion);
    assert_eq!(outcome.state, SessionState::Draining);
    assert_eq!(outcome.reason, ReasonCode::None);
    assert_eq!(outcome.detail, DetailCode::RecordingComplete);
}

#[test]
fn terminal_outcome_clean_completion_non_vod_fails() {
    let outcome = terminal_outcome(StopIntent::None, ReasonCode::ClientStop, Phase::Running, Cause::CleanCompletion);
    assert_eq!(outcome.state, SessionState::Failed);
    assert_eq!(outcome.reason, ReasonCode::ProcessEnded);
}

#[test]
fn terminal_outcome_deadline_exceeded_during_start_is_tune_timeout() {
    let outcome = terminal_outcome(StopIntent::None, ReasonCode::ClientStop, Phase::Start, Cause::DeadlineExceeded);
    assert_eq!(outcome.state, SessionState::Failed);
    assert_eq!(outcome.reason, ReasonCode::TuneTimeout);
    assert_eq!(outcome.detail, DetailCode::DeadlineExceeded);
}

#[test]
fn terminal_outcome_deadline_exceeded_outside_start_is_generic() {
    let outcome = terminal_outcome(StopIntent::None, ReasonCode::ClientStop, Phase::Running, Cause::DeadlineExceeded);
    assert_eq!(outcome.reason, ReasonCode::DeadlineExceeded);
}

#[test]
fn terminal_outcome_context_cancelled() {
    let outcome = terminal_outcome(StopIntent::None, ReasonCode::ClientStop, Phase::Running, Cause::ContextCancelled);
    assert_eq!(outcome.state, SessionState::Cancelled);
    assert_eq!(outcome.reason, ReasonCode::Cancelled);
    assert_eq!(outcome.detail, DetailCode::ContextCanceled);
}

#[test]
fn stopped_state_never_carries_cancel_style_detail_codes() {
    // Any path that resolves to Stopped must not surface ContextCanceled or
    // DeadlineExceeded as its detail code.
    for &phase in &[Phase::Start, Phase::Running, Phase::Teardown, Phase::VODComplete] {
        let outcome = terminal_outcome(
            StopIntent::None,
            ReasonCode::ClientStop,
            phase,
            Cause::Classified(ReasonCode::ClientStop, DetailCode::None, None),
        );
        if outcome.state == SessionState::Stopped {
            assert!(!matches!(
                outcome.detail,
                DetailCode::ContextCanceled | DetailCode::DeadlineExceeded
            ));
        }
    }
}

#[test]
fn terminal_outcome_classified_carries_its_debug_text_through() {
    let outcome = terminal_outcome(
        StopIntent::None,
        ReasonCode::ClientStop,
        Phase::Running,
        Cause::Classified(ReasonCode::LeaseBusy, DetailCode::None, Some("no tuner slots available".to_string())),
    );
    assert_eq!(outcome.detail_debug.as_deref(), Some("no tuner slots available"));
}
