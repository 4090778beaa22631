use super::*;

#[test]
fn tuners_in_use_gauge_tracks_inc_dec() {
    let metrics = Metrics::new();
    metrics.inc_tuners_in_use();
    metrics.inc_tuners_in_use();
    metrics.dec_tuners_in_use();
    assert_eq!(metrics.snapshot().tuners_in_use, 1);
}

#[test]
fn session_end_total_is_keyed_by_reason_and_profile() {
    let metrics = Metrics::new();
    metrics.inc_session_end(ReasonCode::ClientStop, "hd");
    metrics.inc_session_end(ReasonCode::ClientStop, "hd");
    metrics.inc_session_end(ReasonCode::LeaseBusy, "sd");

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.session_end_total[&("ClientStop".to_string(), "hd".to_string())], 2);
    assert_eq!(snapshot.session_end_total[&("LeaseBusy".to_string(), "sd".to_string())], 1);
}

#[test]
fn ttfp_tracks_count_sum_and_max_per_profile() {
    let metrics = Metrics::new();
    metrics.observe_ttfp("hd", 100);
    metrics.observe_ttfp("hd", 300);

    let snapshot = metrics.snapshot();
    let stats = snapshot.ttfp_ms["hd"];
    assert_eq!(stats.count, 2);
    assert_eq!(stats.sum_ms, 400);
    assert_eq!(stats.max_ms, 300);
    assert_eq!(stats.mean_ms(), 200.0);
}

#[test]
fn snapshot_captures_deltas_not_absolutes() {
    let metrics = Metrics::new();
    metrics.inc_tuner_busy();
    let before = metrics.snapshot();
    metrics.inc_tuner_busy();
    let after = metrics.snapshot();

    assert_eq!(after.tuner_busy_total - before.tuner_busy_total, 1);
}
