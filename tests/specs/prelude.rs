//! Test helpers for black-box CLI specifications.
//!
//! These tests invoke the built `xg2g`/`xg2gd` binaries against an
//! isolated state directory and assert on stdout/stderr/exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::PathBuf;
use std::process::Command;

use assert_cmd::cargo::CommandCargoExt;
use tempfile::TempDir;

use xg2g_core::{Mode, Profile, SessionId};
use xg2g_storage::Store;

/// An isolated daemon state directory for one test.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Build a `Command` for the `xg2g` CLI, scoped to this workspace's
    /// state directory.
    pub fn xg2g(&self) -> Command {
        let mut cmd = Command::cargo_bin("xg2g").expect("xg2g binary built");
        cmd.env("XG2G_STATE_DIR", self.state_dir());
        cmd
    }

    /// Open (creating if absent) the durable store directly, bypassing the
    /// daemon, to seed fixture sessions for read-only CLI specs.
    pub fn store(&self) -> Store {
        let wal = self.state_dir().join("wal").join("events.wal");
        let snapshot = self.state_dir().join("snapshot.json");
        Store::open(&wal, &snapshot).expect("open store")
    }

    /// Seed one LIVE session in `New` state with the given id/service ref.
    pub fn seed_session(&self, id: &str, service_ref: &str) {
        let store = self.store();
        let profile = Profile {
            id: "default".to_string(),
            codec: "h264".to_string(),
            quality: "high".to_string(),
            dvr_window_secs: 0,
            is_vod: false,
        };
        store
            .create_session(
                SessionId::parse(id).expect("valid id"),
                service_ref,
                profile,
                "corr-1",
                Mode::Live,
                1_000,
            )
            .expect("seed session");
    }
}

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;
