// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic in-memory `MediaPipeline` for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MediaPipeline, PipelineError, PipelineHandle, PipelineHealth, StreamSpec};

/// Recorded pipeline call, for assertions in orchestrator tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    Start(StreamSpec),
    Stop(PipelineHandle),
    Health(PipelineHandle),
}

struct State {
    calls: Vec<PipelineCall>,
    healthy: HashMap<String, bool>,
    fail_start: Option<PipelineError>,
    next_handle: u64,
}

/// Fake pipeline. By default every session starts healthy; call
/// `set_healthy(handle, false)` or `fail_next_start` to drive failure paths
/// in orchestrator tests without touching a real subprocess.
#[derive(Clone)]
pub struct FakePipeline {
    state: Arc<Mutex<State>>,
}

impl Default for FakePipeline {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                healthy: HashMap::new(),
                fail_start: None,
                next_handle: 0,
            })),
        }
    }
}

impl FakePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PipelineCall> {
        self.state.lock().calls.clone()
    }

    pub fn set_healthy(&self, handle: &PipelineHandle, healthy: bool) {
        self.state.lock().healthy.insert(handle.0.clone(), healthy);
    }

    /// Make the next `start()` call fail with `err` instead of succeeding.
    pub fn fail_next_start(&self, err: PipelineError) {
        self.state.lock().fail_start = Some(err);
    }
}

#[async_trait]
impl MediaPipeline for FakePipeline {
    async fn start(&self, spec: &StreamSpec) -> Result<PipelineHandle, PipelineError> {
        let mut state = self.state.lock();
        state.calls.push(PipelineCall::Start(spec.clone()));
        if let Some(err) = state.fail_start.take() {
            return Err(err);
        }
        state.next_handle += 1;
        let handle = PipelineHandle(format!("fake-{}-{}", spec.session_id, state.next_handle));
        state.healthy.insert(handle.0.clone(), true);
        Ok(handle)
    }

    async fn stop(&self, handle: &PipelineHandle) -> Result<(), PipelineError> {
        let mut state = self.state.lock();
        state.calls.push(PipelineCall::Stop(handle.clone()));
        state.healthy.remove(&handle.0);
        Ok(())
    }

    async fn health(&self, handle: &PipelineHandle) -> Result<PipelineHealth, PipelineError> {
        let mut state = self.state.lock();
        state.calls.push(PipelineCall::Health(handle.clone()));
        match state.healthy.get(&handle.0) {
            Some(true) => Ok(PipelineHealth::healthy()),
            Some(false) => Ok(PipelineHealth::unhealthy("fake pipeline marked unhealthy")),
            None => Err(PipelineError::UnknownHandle(handle.0.clone())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
