// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Media-pipeline port (spec §4.G): a narrow capability the orchestrator
//! drives without knowing whether the other end is a subprocess transcoder,
//! a test double, or (eventually) something else entirely.

mod subprocess;
mod traced;

pub use subprocess::SubprocessPipeline;
pub use traced::TracedPipeline;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePipeline;

use async_trait::async_trait;
use thiserror::Error;

/// Playback mode a `StreamSpec` is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Live,
    Recording,
}

/// Where the pipeline should read its source from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    TunerSlot(u32),
    Url(String),
    File(String),
}

/// Output quality/codec selection, mirrored from `xg2g_core::Profile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quality {
    pub codec: String,
    pub quality: String,
}

/// Everything the media pipeline needs to start a stream (spec §4.G).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub session_id: String,
    pub mode: StreamMode,
    pub output_format: String,
    pub source: SourceRef,
    pub quality: Quality,
}

/// Opaque handle returned by `start`; meaningless to callers beyond passing
/// it back to `stop`/`health`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub String);

impl std::fmt::Display for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current liveness of a running pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineHealth {
    pub healthy: bool,
    pub message: Option<String>,
}

impl PipelineHealth {
    pub fn healthy() -> Self {
        Self { healthy: true, message: None }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self { healthy: false, message: Some(message.into()) }
    }
}

/// Errors a `MediaPipeline` implementation may surface. Classified by
/// `xg2g_engine::classify` into the spec §4.C reason taxonomy; this enum
/// itself stays a flat, typed vocabulary so the classifier needs no
/// downcasting tricks.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Preflight validation failed before the pipeline ever started (spec
    /// §4.G: "no valid transport stream").
    #[error("no valid transport stream for source")]
    NoValidTransportStream,
    #[error("pipeline start failed: {0}")]
    StartFailed(String),
    #[error("pipeline stop failed: {0}")]
    StopFailed(String),
    #[error("unknown pipeline handle: {0}")]
    UnknownHandle(String),
    #[error("external process exited with code {0}")]
    ProcessExited(i32),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability `{Start, Stop, Health}` on a `StreamSpec` (spec §4.G). Cloned
/// freely — implementations are expected to be thin handles around shared
/// state (an `Arc<Mutex<...>>` or a subprocess table keyed by handle).
#[async_trait]
pub trait MediaPipeline: Send + Sync + 'static {
    async fn start(&self, spec: &StreamSpec) -> Result<PipelineHandle, PipelineError>;
    async fn stop(&self, handle: &PipelineHandle) -> Result<(), PipelineError>;
    async fn health(&self, handle: &PipelineHandle) -> Result<PipelineHealth, PipelineError>;
}
