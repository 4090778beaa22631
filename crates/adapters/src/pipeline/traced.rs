// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper that adds tracing spans/fields around any `MediaPipeline`.

use async_trait::async_trait;
use tracing::Instrument;

use super::{MediaPipeline, PipelineError, PipelineHandle, PipelineHealth, StreamSpec};

#[derive(Clone)]
pub struct TracedPipeline<P> {
    inner: P,
}

impl<P> TracedPipeline<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: MediaPipeline> MediaPipeline for TracedPipeline<P> {
    async fn start(&self, spec: &StreamSpec) -> Result<PipelineHandle, PipelineError> {
        let span = tracing::info_span!("pipeline.start", session_id = %spec.session_id);
        async {
            let started = std::time::Instant::now();
            let result = self.inner.start(spec).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(handle) => tracing::info!(%handle, elapsed_ms, "pipeline started"),
                Err(e) => tracing::error!(error = %e, elapsed_ms, "pipeline start failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn stop(&self, handle: &PipelineHandle) -> Result<(), PipelineError> {
        let result = self.inner.stop(handle).await;
        tracing::info_span!("pipeline.stop", %handle).in_scope(|| match &result {
            Ok(()) => tracing::info!("pipeline stopped"),
            Err(e) => tracing::warn!(error = %e, "pipeline stop failed (may already be dead)"),
        });
        result
    }

    async fn health(&self, handle: &PipelineHandle) -> Result<PipelineHealth, PipelineError> {
        let result = self.inner.health(handle).await;
        if let Ok(health) = &result {
            if !health.healthy {
                tracing::warn!(%handle, message = ?health.message, "pipeline unhealthy");
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
