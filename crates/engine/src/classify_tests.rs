use super::*;

#[test]
fn cancelled_maps_to_context_canceled() {
    let c = classify_cancelled();
    assert_eq!(c.reason, ReasonCode::Cancelled);
    assert_eq!(c.detail, DetailCode::ContextCanceled);
}

#[test]
fn process_exit_with_code_reports_it_in_debug() {
    let c = classify_process_exit(Some(137));
    assert_eq!(c.reason, ReasonCode::ProcessEnded);
    assert_eq!(c.detail, DetailCode::None);
    assert_eq!(c.debug, "process exit code 137");
}

#[test]
fn process_exit_without_code_uses_placeholder() {
    let c = classify_process_exit(None);
    assert_eq!(c.debug, "process exit code <unknown>");
}

#[yare::parameterized(
    no_valid_transport_stream = {
        PipelineError::NoValidTransportStream,
        ReasonCode::TuneFailed,
    },
    start_failed = {
        PipelineError::StartFailed("boom".to_string()),
        ReasonCode::PipelineStartFailed,
    },
    stop_failed = {
        PipelineError::StopFailed("kill refused".to_string()),
        ReasonCode::PackagerFailed,
    },
    process_exited = {
        PipelineError::ProcessExited(1),
        ReasonCode::ProcessEnded,
    },
    unknown_handle = {
        PipelineError::UnknownHandle("abc".to_string()),
        ReasonCode::InvariantViolation,
    },
)]
fn pipeline_error_classifies_into_the_expected_reason(err: PipelineError, expected: ReasonCode) {
    assert_eq!(classify_pipeline_error(&err).reason, expected);
}

#[test]
fn start_failed_carries_its_message_through_as_debug() {
    let c = classify_pipeline_error(&PipelineError::StartFailed("boom".to_string()));
    assert_eq!(c.debug, "boom");
}

#[test]
fn fallback_classification_sanitizes_debug() {
    let c = classify_unknown("line one\nline two");
    assert_eq!(c.reason, ReasonCode::Unknown);
    assert_eq!(c.debug, "line one line two");
}
