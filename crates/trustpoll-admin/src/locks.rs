//! Per-key action locks
//!
//! At most one mutation may be in flight per key. A key is the subject of the
//! mutation: a flagged identity, a candidate id, or one of the fixed keys for
//! dashboard-wide actions. Distinct keys never wait on each other.
//!
//! Derived keys carry a `subject:` or `candidate:` prefix, so a wallet named
//! `7` or `publish-results` never collides with a candidate or a fixed key.

use dashmap::DashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Fixed and derived lock keys.
pub mod keys {
    use trustpoll_client::Subject;

    pub const ADD_CANDIDATE: &str = "add-candidate";
    pub const PUBLISH_RESULTS: &str = "publish-results";
    pub const FAIRNESS_REPORT: &str = "fairness-report";

    /// Flag actions (acknowledge and block) share the subject's key.
    pub fn subject(subject: &Subject) -> String {
        format!("subject:{}", subject.value)
    }

    pub fn candidate(id: i64) -> String {
        format!("candidate:{id}")
    }
}

/// Set of busy keys, shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct ActionLocks {
    held: Arc<DashSet<String>>,
}

impl ActionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` busy. Returns false if it already was.
    pub fn try_acquire(&self, key: &str) -> bool {
        let acquired = self.held.insert(key.to_string());
        trace!(key, acquired, "try_acquire");
        acquired
    }

    pub fn release(&self, key: &str) {
        self.held.remove(key);
        trace!(key, "release");
    }

    /// Acquire `key` for the lifetime of the returned guard.
    pub fn guard(&self, key: &str) -> Option<ActionGuard> {
        self.try_acquire(key).then(|| ActionGuard {
            locks: self.clone(),
            key: key.to_string(),
        })
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub fn busy_keys(&self) -> BTreeSet<String> {
        self.held.iter().map(|key| key.key().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// Releases its key when dropped, whatever the mutation's outcome.
#[derive(Debug)]
pub struct ActionGuard {
    locks: ActionLocks,
    key: String,
}

impl ActionGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.locks.release(&self.key);
    }
}
