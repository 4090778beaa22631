// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process `EventBus` over `tokio::sync::broadcast`. Each topic gets its
//! own channel so a slow `stop-session` subscriber never drops
//! `start-session` traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{EventBus, Subscription, Topic};

const DEFAULT_CAPACITY: usize = 256;

struct Channels<E> {
    start_session: broadcast::Sender<E>,
    stop_session: broadcast::Sender<E>,
}

/// Bounded, non-blocking, in-process bus. `publish` never awaits: when a
/// subscriber's ring buffer is full, `broadcast` drops the oldest entry for
/// that subscriber and `recv` reports the lag via `dropped_count`.
pub struct InMemoryBus<E> {
    channels: Channels<E>,
    dropped: Arc<AtomicU64>,
}

impl<E: Clone + Send + 'static> InMemoryBus<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Channels {
                start_session: broadcast::channel(capacity).0,
                stop_session: broadcast::channel(capacity).0,
            },
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<E> {
        match topic {
            Topic::StartSession => &self.channels.start_session,
            Topic::StopSession => &self.channels.stop_session,
        }
    }
}

impl<E: Clone + Send + 'static> Default for InMemoryBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> EventBus<E> for InMemoryBus<E> {
    type Sub = BroadcastSubscription<E>;

    fn publish(&self, topic: Topic, event: E) {
        // `send` returns an error only when there are zero receivers; that
        // is not a fault (the orchestrator may not have subscribed yet, or
        // the bus is being drained during shutdown), so it is dropped
        // rather than surfaced.
        let _ = self.sender(topic).send(event);
    }

    fn subscribe(&self, topic: Topic) -> Self::Sub {
        BroadcastSubscription {
            receiver: self.sender(topic).subscribe(),
            dropped: self.dropped.clone(),
        }
    }

    fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct BroadcastSubscription<E> {
    receiver: broadcast::Receiver<E>,
    dropped: Arc<AtomicU64>,
}

#[async_trait]
impl<E: Clone + Send + 'static> Subscription<E> for BroadcastSubscription<E> {
    async fn recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "inmemory_tests.rs"]
mod tests;
