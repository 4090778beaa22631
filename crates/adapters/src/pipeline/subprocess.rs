// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production `MediaPipeline`: spawns/health-checks/kills an external
//! transcoder/packager process per session.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::{Child, Command};

use super::{MediaPipeline, PipelineError, PipelineHandle, PipelineHealth, SourceRef, StreamSpec};

struct Handles {
    children: HashMap<String, Child>,
}

/// Spawns `binary` once per session with arguments derived from the
/// `StreamSpec`, and tracks the child process to answer `health`/`stop`.
///
/// Outbound HTTP sources are validated against `allowed_url_prefixes` before
/// the process is spawned (spec §4.E step 7: "direct-HTTP sources are
/// validated against the outbound policy before starting").
pub struct SubprocessPipeline {
    binary: String,
    allowed_url_prefixes: Vec<String>,
    handles: Arc<Mutex<Handles>>,
}

impl SubprocessPipeline {
    pub fn new(binary: impl Into<String>, allowed_url_prefixes: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            allowed_url_prefixes,
            handles: Arc::new(Mutex::new(Handles { children: HashMap::new() })),
        }
    }

    fn validate_source(&self, source: &SourceRef) -> Result<(), PipelineError> {
        if let SourceRef::Url(url) = source {
            if !self
                .allowed_url_prefixes
                .iter()
                .any(|prefix| url.starts_with(prefix.as_str()))
            {
                return Err(PipelineError::NoValidTransportStream);
            }
        }
        Ok(())
    }

    fn args_for(spec: &StreamSpec) -> Vec<String> {
        let mut args = vec![
            "--session".to_string(),
            spec.session_id.clone(),
            "--format".to_string(),
            spec.output_format.clone(),
            "--codec".to_string(),
            spec.quality.codec.clone(),
            "--quality".to_string(),
            spec.quality.quality.clone(),
        ];
        match &spec.source {
            SourceRef::TunerSlot(slot) => {
                args.push("--tuner-slot".to_string());
                args.push(slot.to_string());
            }
            SourceRef::Url(url) => {
                args.push("--source-url".to_string());
                args.push(url.clone());
            }
            SourceRef::File(path) => {
                args.push("--source-file".to_string());
                args.push(path.clone());
            }
        }
        args
    }
}

#[async_trait]
impl MediaPipeline for SubprocessPipeline {
    async fn start(&self, spec: &StreamSpec) -> Result<PipelineHandle, PipelineError> {
        self.validate_source(&spec.source)?;

        let child = Command::new(&self.binary)
            .args(Self::args_for(spec))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let handle = PipelineHandle(spec.session_id.clone());
        self.handles.lock().children.insert(handle.0.clone(), child);
        tracing::info!(session_id = %spec.session_id, binary = %self.binary, "pipeline process spawned");
        Ok(handle)
    }

    async fn stop(&self, handle: &PipelineHandle) -> Result<(), PipelineError> {
        let child = self.handles.lock().children.remove(&handle.0);
        match child {
            Some(mut child) => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!(handle = %handle, error = %e, "kill failed (may already be dead)");
                }
                let _ = child.wait().await;
                Ok(())
            }
            None => Err(PipelineError::UnknownHandle(handle.0.clone())),
        }
    }

    async fn health(&self, handle: &PipelineHandle) -> Result<PipelineHealth, PipelineError> {
        let mut guard = self.handles.lock();
        let child = guard
            .children
            .get_mut(&handle.0)
            .ok_or_else(|| PipelineError::UnknownHandle(handle.0.clone()))?;

        match child.try_wait() {
            Ok(None) => Ok(PipelineHealth::healthy()),
            Ok(Some(status)) => {
                guard.children.remove(&handle.0);
                Ok(PipelineHealth::unhealthy(format!(
                    "process exited with status {status}"
                )))
            }
            Err(e) => Ok(PipelineHealth::unhealthy(format!("wait failed: {e}"))),
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
