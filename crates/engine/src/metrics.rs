// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process metrics registry (spec §2.J). Plain atomics and a small
//! mutex-guarded map, not a third-party metrics facade — the teacher pack
//! carries no metrics crate dependency, so this follows the same
//! plain-struct convention the adapters' event bus uses for its
//! dropped-message counter (`xg2g_adapters::bus::InMemoryBus`).
//!
//! Metrics are process-global; the core never reads them for control flow
//! (spec §9). Tests capture deltas via [`Metrics::snapshot`], never
//! absolutes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use xg2g_core::ReasonCode;

/// A running count + sum of a duration series, cheap enough to update on
/// every sample without a histogram library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationStats {
    pub count: u64,
    pub sum_ms: u64,
    pub max_ms: u64,
}

impl DurationStats {
    fn observe(&mut self, ms: u64) {
        self.count += 1;
        self.sum_ms += ms;
        self.max_ms = self.max_ms.max(ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ms as f64 / self.count as f64
        }
    }
}

/// A point-in-time copy of the registry's state, cheap to diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tuners_in_use: u64,
    pub tuner_busy_total: u64,
    pub dropped_bus_events: u64,
    /// `session_end_total{reason, profile}`.
    pub session_end_total: HashMap<(String, String), u64>,
    /// Time-to-first-playlist, per profile.
    pub ttfp_ms: HashMap<String, DurationStats>,
}

/// `xg2g_tuners_in_use` gauge, `session_end_total{reason,profile}` counter,
/// and the TTFP histogram named in spec.md §2.J, updated only by the
/// orchestrator and sweeper (never handlers directly — spec §5's
/// shared-resource policy guards against double-counting).
#[derive(Default)]
pub struct Metrics {
    tuners_in_use: AtomicU64,
    tuner_busy_total: AtomicU64,
    dropped_bus_events: AtomicU64,
    session_end_total: Mutex<HashMap<(String, String), u64>>,
    ttfp_ms: Mutex<HashMap<String, DurationStats>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reconciled tuner-in-use gauge (spec §4.E step 6).
    pub fn set_tuners_in_use(&self, count: u64) {
        self.tuners_in_use.store(count, Ordering::Relaxed);
    }

    pub fn inc_tuners_in_use(&self) {
        self.tuners_in_use.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_tuners_in_use(&self) {
        self.tuners_in_use.fetch_sub(1, Ordering::Relaxed);
    }

    /// Incremented only for capacity rejections, never dedup contention
    /// (spec §4.E "concurrency bounds and semantics").
    pub fn inc_tuner_busy(&self) {
        self.tuner_busy_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_dropped_bus_events(&self, count: u64) {
        self.dropped_bus_events.store(count, Ordering::Relaxed);
    }

    pub fn inc_session_end(&self, reason: ReasonCode, profile: &str) {
        let key = (format!("{reason:?}"), profile.to_string());
        *self.session_end_total.lock().entry(key).or_insert(0) += 1;
    }

    pub fn observe_ttfp(&self, profile: &str, elapsed_ms: u64) {
        self.ttfp_ms.lock().entry(profile.to_string()).or_default().observe(elapsed_ms);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tuners_in_use: self.tuners_in_use.load(Ordering::Relaxed),
            tuner_busy_total: self.tuner_busy_total.load(Ordering::Relaxed),
            dropped_bus_events: self.dropped_bus_events.load(Ordering::Relaxed),
            session_end_total: self.session_end_total.lock().clone(),
            ttfp_ms: self.ttfp_ms.lock().clone(),
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
