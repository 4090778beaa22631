// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production `Platform`: real filesystem, confined to a configured root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Platform, PlatformError};

/// Real OS platform, confined to `root` for every `join`/`remove_all` call.
pub struct OsPlatform {
    root: PathBuf,
}

impl OsPlatform {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Platform for OsPlatform {
    fn identity(&self) -> String {
        let hostname = hostname_best_effort();
        format!("{hostname}-{}", std::process::id())
    }

    fn join(&self, components: &[&str]) -> Result<PathBuf, PlatformError> {
        let mut path = self.root.clone();
        for component in components {
            if component.contains("..") || Path::new(component).is_absolute() {
                return Err(PlatformError::PathEscapesRoot(component.to_string()));
            }
            path.push(component);
        }
        Ok(path)
    }

    async fn remove_all(&self, path: &Path) -> Result<(), PlatformError> {
        if !path.starts_with(&self.root) {
            return Err(PlatformError::PathEscapesRoot(path.display().to_string()));
        }
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    async fn file_len(&self, path: &Path) -> Result<u64, PlatformError> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, PlatformError> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn list_dirs(&self, path: &Path) -> Result<Vec<String>, PlatformError> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    async fn modified_at_ms(&self, path: &Path) -> Result<i64, PlatformError> {
        let modified = tokio::fs::metadata(path).await?.modified()?;
        Ok(modified
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0))
    }
}

fn hostname_best_effort() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
#[path = "os_tests.rs"]
mod tests;
