// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform port (spec §4.I): OS identity and filesystem operations,
//! confined to `hlsRoot` in production.

mod os;

pub use os::OsPlatform;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePlatform;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("path escapes confined root: {0}")]
    PathEscapesRoot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// `Identity`/`Join`/`RemoveAll` (spec §4.I). Production implementations
/// confine `join`/`remove_all` to a configured root (`hlsRoot`); tests
/// substitute a safe, in-memory variant.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// A stable tag identifying this process (hostname + pid, or similar),
    /// used to build the orchestrator's `owner` string.
    fn identity(&self) -> String;

    /// Join path components under the confined root, rejecting any
    /// component that would escape it (`..`, absolute paths).
    fn join(&self, components: &[&str]) -> Result<PathBuf, PlatformError>;

    async fn remove_all(&self, path: &Path) -> Result<(), PlatformError>;

    async fn exists(&self, path: &Path) -> bool;

    /// Read file metadata length; used by the playlist-readiness check to
    /// confirm a referenced segment is non-empty.
    async fn file_len(&self, path: &Path) -> Result<u64, PlatformError>;

    async fn read_to_string(&self, path: &Path) -> Result<String, PlatformError>;

    /// List the immediate subdirectory names under `path` (used by the
    /// sweeper's file scan). Non-directory entries are skipped.
    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>, PlatformError>;

    /// Last-modified time of `path`, in epoch milliseconds. Used by the
    /// sweeper's file scan to gate orphan-directory removal on
    /// `sweeper.fileRetention` rather than deleting on sight.
    async fn modified_at_ms(&self, path: &Path) -> Result<i64, PlatformError>;
}
