// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Narrow capability ports the orchestrator consumes from the outside world
//! (spec §4.G/H/I): the media pipeline, the in-process event bus, and the
//! platform (identity + filesystem). Each port is a trait plus a production
//! implementation plus a fake for deterministic tests.

pub mod bus;
pub mod pipeline;
pub mod platform;

pub use bus::{BusError, EventBus, InMemoryBus, Subscription, Topic};
pub use pipeline::{
    MediaPipeline, PipelineError, PipelineHandle, PipelineHealth, Quality, SourceRef, StreamMode,
    StreamSpec, SubprocessPipeline, TracedPipeline,
};
pub use platform::{OsPlatform, Platform, PlatformError};

#[cfg(any(test, feature = "test-support"))]
pub use pipeline::FakePipeline;
#[cfg(any(test, feature = "test-support"))]
pub use platform::FakePlatform;
