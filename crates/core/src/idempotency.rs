// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency record data model. Duplicate submits carrying the same key
//! within its TTL window return the same session id (spec §3).

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub session_id: SessionId,
    pub expires_at_ms: i64,
}

impl IdempotencyRecord {
    pub fn new(key: impl Into<String>, session_id: SessionId, expires_at_ms: i64) -> Self {
        Self {
            key: key.into(),
            session_id,
            expires_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
