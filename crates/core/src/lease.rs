// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease data model. A lease asserts exclusive, time-bounded ownership of a
//! namespaced key. See spec §3 and §4.D; the atomic acquire/renew/release
//! operations themselves live in `xg2g-storage` since they require a
//! serialized write transaction this crate deliberately has no opinion on.

use serde::{Deserialize, Serialize};

/// Namespaced lease key: `tuner:<slot>`, `service:<ref>`, or the singleton
/// `system:orchestrator:guard_lock`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaseKey(String);

pub const GUARD_LOCK_KEY: &str = "system:orchestrator:guard_lock";

impl LeaseKey {
    pub fn tuner(slot: impl std::fmt::Display) -> Self {
        Self(format!("tuner:{slot}"))
    }

    pub fn service(service_ref: &str) -> Self {
        Self(format!("service:{service_ref}"))
    }

    pub fn guard_lock() -> Self {
        Self(GUARD_LOCK_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LeaseKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LeaseKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single lease row: at most one non-expired row may exist per key
/// (spec §3 invariant). `owner` is a session id or a stable worker id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub key: LeaseKey,
    pub owner: String,
    pub expires_at_ms: i64,
}

impl Lease {
    pub fn new(key: LeaseKey, owner: impl Into<String>, expires_at_ms: i64) -> Self {
        Self {
            key,
            owner: owner.into(),
            expires_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
