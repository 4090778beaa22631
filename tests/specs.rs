// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specifications for the `xg2g` CLI against a real durable
//! store, matching the teacher's `oj-specs` root-package convention for
//! workspace-level integration tests (SPEC_FULL.md §8 "ambient").
//!
//! These exercise the CLI binary as a subprocess against an isolated state
//! directory; they do not start the daemon (no media pipeline/bus wiring
//! here), so they cover the read-only inspection surface (`sessions`,
//! `status`) rather than the orchestrator's live lifecycle, which is
//! covered by deterministic unit tests in `xg2g-engine`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

use prelude::Workspace;

fn stdout_of(cmd: &mut std::process::Command) -> String {
    let output = cmd.output().expect("run xg2g");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

#[test]
fn status_reports_not_running_with_no_daemon_and_no_store() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.xg2g().arg("status"));
    assert!(stdout.contains("not running"), "stdout: {stdout}");
}

#[test]
fn sessions_list_is_empty_before_any_session_exists() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.xg2g().arg("sessions"));
    assert!(stdout.contains("no sessions"), "stdout: {stdout}");
}

#[test]
fn sessions_list_shows_a_seeded_session_in_new_state() {
    let ws = Workspace::new();
    ws.seed_session("session-one", "svc-a");

    let stdout = stdout_of(ws.xg2g().arg("sessions"));

    assert!(stdout.contains("session-one"), "stdout: {stdout}");
    assert!(stdout.contains("NEW"), "stdout: {stdout}");
}

#[test]
fn sessions_list_json_round_trips_through_serde() {
    let ws = Workspace::new();
    ws.seed_session("session-two", "svc-b");

    let stdout = stdout_of(ws.xg2g().args(["-o", "json", "sessions"]));
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    let sessions = parsed.as_array().expect("array");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], "session-two");
    assert_eq!(sessions[0]["state"], "New");
}

#[test]
fn sessions_show_reports_full_detail_for_a_known_session() {
    let ws = Workspace::new();
    ws.seed_session("session-three", "svc-c");

    let stdout = stdout_of(ws.xg2g().args(["sessions", "show", "session-three"]));

    assert!(stdout.contains("session-three"), "stdout: {stdout}");
    assert!(stdout.contains("svc-c"), "stdout: {stdout}");
}

#[test]
fn sessions_show_fails_for_an_unknown_session_id() {
    let ws = Workspace::new();
    let output = ws.xg2g().args(["sessions", "show", "does-not-exist"]).output().expect("run xg2g");
    assert!(!output.status.success());
}

#[test]
fn stop_reports_not_running_when_no_pid_file_exists() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.xg2g().arg("stop"));
    assert!(stdout.contains("not running"), "stdout: {stdout}");
}

#[test]
fn version_flag_prints_a_version_and_exits_zero() {
    let ws = Workspace::new();
    let output = ws.xg2g().arg("--version").output().expect("run xg2g");
    assert!(output.status.success());
}
