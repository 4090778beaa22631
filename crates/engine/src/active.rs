// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `active` session→cancel map (spec §5 "shared-resource policy"):
//! lets a Stop event cancel an in-flight Start handler. Guarded by a mutex,
//! as the spec requires.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct ActiveMap {
    inner: Mutex<HashMap<String, CancellationToken>>,
}

impl ActiveMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cancel hook for `session_id`, returning the token the
    /// handler should watch.
    pub fn register(&self, session_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner.lock().insert(session_id.to_string(), token.clone());
        token
    }

    /// Cancel the handler registered for `session_id`, if any. Returns
    /// whether a handler was found and cancelled.
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.inner.lock().get(session_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn deregister(&self, session_id: &str) {
        self.inner.lock().remove(session_id);
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.inner.lock().contains_key(session_id)
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
