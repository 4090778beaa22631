// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reason classifier (spec §4.C). Inspects the concrete error types the
//! orchestrator actually encounters and maps them to the core's stable
//! `(ReasonCode, DetailCode, sanitizedDebug)` vocabulary. The taxonomy types
//! themselves live in `xg2g_core::reason` since they carry no I/O
//! dependency; this module is where the concrete-type knowledge lives.

use xg2g_adapters::PipelineError;
use xg2g_core::reason::sanitize_debug;
use xg2g_core::{DetailCode, ReasonCode};

/// Output of the classifier: the public pair plus a debug string that is
/// logged with the correlation id but never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub reason: ReasonCode,
    pub detail: DetailCode,
    pub debug: String,
}

impl Classification {
    fn new(reason: ReasonCode, detail: DetailCode, debug: impl Into<String>) -> Self {
        Self { reason, detail, debug: sanitize_debug(&debug.into()) }
    }
}

/// Classify a cancellation (rule 2, spec §4.C).
pub fn classify_cancelled() -> Classification {
    Classification::new(ReasonCode::Cancelled, DetailCode::ContextCanceled, "context cancelled")
}

/// Classify a `tokio::time::error::Elapsed` deadline (rule 3, spec §4.C).
/// The phase-aware TuneTimeout/DeadlineExceeded split is the terminalize
/// resolver's job (`xg2g_core::lifecycle::terminal_outcome`), not this
/// function's — it always reports the same pair here.
pub fn classify_deadline_exceeded(_elapsed: tokio::time::error::Elapsed) -> Classification {
    Classification::new(ReasonCode::TuneTimeout, DetailCode::DeadlineExceeded, "deadline exceeded")
}

/// Classify an external process exit (rule 5, spec §4.C).
pub fn classify_process_exit(code: Option<i32>) -> Classification {
    let debug = match code {
        Some(code) => format!("process exit code {code}"),
        None => "process exit code <unknown>".to_string(),
    };
    Classification::new(ReasonCode::ProcessEnded, DetailCode::None, debug)
}

/// Classify an error from the media-pipeline port (rules 4-6, spec §4.C).
pub fn classify_pipeline_error(err: &PipelineError) -> Classification {
    match err {
        PipelineError::NoValidTransportStream => {
            Classification::new(ReasonCode::TuneFailed, DetailCode::None, err.to_string())
        }
        PipelineError::StartFailed(msg) => {
            Classification::new(ReasonCode::PipelineStartFailed, DetailCode::None, msg.clone())
        }
        PipelineError::StopFailed(msg) => {
            Classification::new(ReasonCode::PackagerFailed, DetailCode::None, msg.clone())
        }
        PipelineError::ProcessExited(code) => classify_process_exit(Some(*code)),
        PipelineError::UnknownHandle(handle) => Classification::new(
            ReasonCode::InvariantViolation,
            DetailCode::None,
            format!("unknown pipeline handle: {handle}"),
        ),
        PipelineError::Io(err) => {
            Classification::new(ReasonCode::Unknown, DetailCode::None, err.to_string())
        }
    }
}

/// Fallback classification for anything not covered by a more specific rule
/// (rule 6, spec §4.C).
pub fn classify_unknown(message: impl Into<String>) -> Classification {
    Classification::new(ReasonCode::Unknown, DetailCode::None, message)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
