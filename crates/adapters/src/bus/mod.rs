// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus port (spec §4.H): topic-scoped publish/subscribe within a
//! single process. `publish` must never block a producer on a slow
//! subscriber — the bounded-buffer/drop-oldest policy lives in the
//! concrete implementation.

mod inmemory;

pub use inmemory::InMemoryBus;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two topics the orchestrator consumes (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    StartSession,
    StopSession,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::StartSession => "start-session",
            Topic::StopSession => "stop-session",
        }
    }
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no subscribers for topic {0:?}")]
    NoSubscribers(Topic),
    #[error("subscription closed")]
    Closed,
}

/// A closable subscription with an owned receive side.
#[async_trait]
pub trait Subscription<E>: Send {
    /// Waits for the next event. Returns `None` once the bus side has been
    /// dropped or the subscription has lagged past recovery.
    async fn recv(&mut self) -> Option<E>;
}

/// Topic-scoped, in-process publish/subscribe (spec §4.H). `publish` is
/// non-blocking for subscribers that cannot keep up: a bounded buffer with
/// an oldest-dropped policy, never a producer stall.
pub trait EventBus<E: Clone + Send + 'static>: Send + Sync + 'static {
    type Sub: Subscription<E>;

    fn publish(&self, topic: Topic, event: E);

    fn subscribe(&self, topic: Topic) -> Self::Sub;

    /// Count of events dropped because a subscriber's buffer lagged,
    /// exposed so it isn't silent (spec §4.H transport note).
    fn dropped_count(&self) -> u64;
}
