use super::*;

fn profile() -> Profile {
    Profile {
        id: "hd".to_string(),
        codec: "h264".to_string(),
        quality: "1080p".to_string(),
        dvr_window_secs: 0,
        is_vod: false,
    }
}

#[test]
fn session_id_parse_accepts_safe_grammar() {
    assert!(SessionId::parse("sess-123_abc").is_ok());
}

#[test]
fn session_id_parse_rejects_path_separators() {
    assert!(SessionId::parse("../etc/passwd").is_err());
    assert!(SessionId::parse("a/b").is_err());
}

#[test]
fn session_id_parse_rejects_empty() {
    assert!(SessionId::parse("").is_err());
}

#[test]
fn is_safe_session_id_matches_parse() {
    assert!(SessionId::is_safe_session_id("abc"));
    assert!(!SessionId::is_safe_session_id("a b"));
}

#[test]
fn new_session_record_seeds_new_state_and_mode() {
    let record = SessionRecord::new(
        SessionId::new("s1"),
        "svc:1",
        profile(),
        "corr-1",
        Mode::Live,
        1_000,
    );
    assert_eq!(record.state, SessionState::New);
    assert_eq!(record.pipeline_state, PipelineState::Init);
    assert_eq!(record.mode(), Some(Mode::Live));
    assert!(!record.is_terminal());
}

#[test]
fn context_data_tuner_slot_round_trips() {
    let mut ctx = ContextData::new();
    assert!(ctx.tuner_slot().is_none());
    ctx.set_tuner_slot(2);
    assert_eq!(ctx.tuner_slot(), Some("2"));
}

#[test]
fn context_data_mark_recovered_records_prior_state() {
    let mut ctx = ContextData::new();
    ctx.mark_recovered(SessionState::Starting);
    assert_eq!(ctx.get(KEY_RECOVERED), Some("true"));
    assert_eq!(ctx.get(KEY_RECOVERED_FROM), Some("STARTING"));
}

#[test]
fn touch_updates_both_timestamps() {
    let mut record = SessionRecord::new(
        SessionId::new("s1"),
        "svc:1",
        profile(),
        "corr-1",
        Mode::Recording,
        1_000,
    );
    record.touch(2_000);
    assert_eq!(record.updated_at_ms, 2_000);
    assert_eq!(record.last_access_at_ms, Some(2_000));
}

#[test]
fn public_view_exposes_only_state_reason_detail() {
    let record = SessionRecord::new(
        SessionId::new("s1"),
        "svc:1",
        profile(),
        "corr-1",
        Mode::Live,
        1_000,
    );
    let (state, reason, detail) = record.public_view();
    assert_eq!(state, SessionState::New);
    assert_eq!(reason, ReasonCode::None);
    assert_eq!(detail, DetailCode::None);
}

// =============================================================================
// Property-Based Tests
// =============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn safe_grammar_always_parses(raw in "[A-Za-z0-9_-]{1,64}") {
            prop_assert!(SessionId::parse(&raw).is_ok());
        }

        #[test]
        fn parse_never_panics(raw in "[ -~]{0,64}") {
            let _ = SessionId::parse(&raw);
        }

        #[test]
        fn any_byte_outside_the_grammar_is_rejected(raw in "[ -~]*[^A-Za-z0-9_-][ -~]*") {
            prop_assume!(!raw.is_empty());
            prop_assert!(SessionId::parse(&raw).is_err());
        }

        #[test]
        fn is_safe_session_id_agrees_with_parse(raw in "[ -~]{0,64}") {
            prop_assert_eq!(SessionId::is_safe_session_id(&raw), SessionId::parse(&raw).is_ok());
        }
    }
}
