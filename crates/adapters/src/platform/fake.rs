// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Platform` for deterministic tests: a confined virtual tree
//! kept in a map rather than on disk, with an injectable identity string.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Platform, PlatformError};

#[derive(Debug, Clone)]
enum Entry {
    Dir,
    File(Vec<u8>),
}

struct State {
    identity: String,
    root: PathBuf,
    entries: BTreeMap<PathBuf, Entry>,
    mtimes: BTreeMap<PathBuf, i64>,
}

/// Fake `Platform` rooted at an arbitrary virtual path. `join` enforces the
/// same escape rules as [`super::os::OsPlatform`]; files must be seeded via
/// [`FakePlatform::write_file`] before a test reads them.
#[derive(Clone)]
pub struct FakePlatform {
    state: Arc<Mutex<State>>,
}

impl FakePlatform {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                identity: "fake-host-1".to_string(),
                root: root.into(),
                entries: BTreeMap::new(),
                mtimes: BTreeMap::new(),
            })),
        }
    }

    pub fn set_identity(&self, identity: impl Into<String>) {
        self.state.lock().identity = identity.into();
    }

    /// Seeds a file (and its parent directory) at `path`.
    pub fn write_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            state.entries.insert(parent.to_path_buf(), Entry::Dir);
        }
        state.entries.insert(path, Entry::File(contents.into()));
    }

    pub fn make_dir(&self, path: impl Into<PathBuf>) {
        self.state.lock().entries.insert(path.into(), Entry::Dir);
    }

    /// Set a directory's fake modification time, in epoch milliseconds.
    /// Defaults to 0 (i.e. "ancient") for any entry never given one.
    pub fn set_modified_at_ms(&self, path: impl Into<PathBuf>, ms: i64) {
        self.state.lock().mtimes.insert(path.into(), ms);
    }
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new("/virtual")
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn identity(&self) -> String {
        self.state.lock().identity.clone()
    }

    fn join(&self, components: &[&str]) -> Result<PathBuf, PlatformError> {
        let state = self.state.lock();
        let mut path = state.root.clone();
        for component in components {
            if component.contains("..") || Path::new(component).is_absolute() {
                return Err(PlatformError::PathEscapesRoot(component.to_string()));
            }
            path.push(component);
        }
        Ok(path)
    }

    async fn remove_all(&self, path: &Path) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if !path.starts_with(&state.root) {
            return Err(PlatformError::PathEscapesRoot(path.display().to_string()));
        }
        state.entries.retain(|entry, _| !entry.starts_with(path));
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.state.lock().entries.contains_key(path)
    }

    async fn file_len(&self, path: &Path) -> Result<u64, PlatformError> {
        match self.state.lock().entries.get(path) {
            Some(Entry::File(bytes)) => Ok(bytes.len() as u64),
            Some(Entry::Dir) | None => Err(PlatformError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            ))),
        }
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, PlatformError> {
        match self.state.lock().entries.get(path) {
            Some(Entry::File(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Some(Entry::Dir) | None => Err(PlatformError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            ))),
        }
    }

    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>, PlatformError> {
        let state = self.state.lock();
        let mut names: Vec<String> = state
            .entries
            .iter()
            .filter_map(|(entry, kind)| {
                if !matches!(kind, Entry::Dir) {
                    return None;
                }
                let rest = entry.strip_prefix(path).ok()?;
                let mut components = rest.components();
                let first = components.next()?;
                if components.next().is_some() {
                    return None;
                }
                first.as_os_str().to_str().map(str::to_string)
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn modified_at_ms(&self, path: &Path) -> Result<i64, PlatformError> {
        let state = self.state.lock();
        if !state.entries.contains_key(path) {
            return Err(PlatformError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.display().to_string(),
            )));
        }
        Ok(state.mtimes.get(path).copied().unwrap_or(0))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
