// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease manager (spec §4.D): a thin, `Clock`-aware wrapper around
//! `xg2g_storage::Store`'s lease operations. The store already enforces the
//! atomicity; this module's job is only to supply `now_ms` from an injected
//! clock so callers never read wall-clock time directly.

use std::sync::Arc;
use std::time::Duration;

use xg2g_core::{Clock, Lease, LeaseKey};
use xg2g_storage::{LeaseOutcome, Store, StoreError};

pub struct LeaseManager<C: Clock> {
    store: Arc<Store>,
    clock: C,
}

impl<C: Clock> LeaseManager<C> {
    pub fn new(store: Arc<Store>, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn try_acquire(
        &self,
        key: &LeaseKey,
        owner: &str,
        ttl: Duration,
    ) -> Result<LeaseOutcome, StoreError> {
        self.store.try_acquire_lease(key, owner, ttl.as_millis() as i64, self.clock.epoch_ms())
    }

    /// Fail-closed: an expired or not-owned lease is an error, never a
    /// silent renewal (spec §4.D).
    pub fn renew(&self, key: &LeaseKey, owner: &str, ttl: Duration) -> Result<Lease, StoreError> {
        self.store.renew_lease(key, owner, ttl.as_millis() as i64, self.clock.epoch_ms())
    }

    pub fn release(&self, key: &LeaseKey, owner: &str) -> Result<(), StoreError> {
        self.store.release_lease(key, owner)
    }

    pub fn get(&self, key: &LeaseKey) -> Option<Lease> {
        self.store.get_lease(key)
    }

    /// Wipe every lease. Only safe immediately after the guard lease is
    /// (re-)acquired at startup (spec §4.E step 3).
    pub fn delete_all(&self) -> Result<(), StoreError> {
        self.store.delete_all_leases()
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.epoch_ms()
    }
}

#[cfg(test)]
#[path = "lease_manager_tests.rs"]
mod tests;
