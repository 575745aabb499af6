// registry.rs — OperationRegistry: the single source of truth for pending
// operations, with TTL-based eviction.
//
// Exactly one registry exists per process, constructed at startup and
// passed explicitly to everything that needs it; tests build their own
// isolated instances. No other component touches the backing map —
// every mutation routes through this type, which is what makes a sweep
// and a revise on the same id safe to interleave.
//
// Expiry is lazy: an entry past its window is invisible to `get`, `take`,
// `update`, and `list` even before any sweep has run. The sweep only
// bounds memory.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::operation::PendingOperation;

/// Default negotiation window, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Process-wide keyed store of pending operations.
pub struct OperationRegistry {
    ops: HashMap<Uuid, PendingOperation>,
    ttl: Duration,
}

impl OperationRegistry {
    /// Create a registry with the given TTL. The TTL is process-wide and
    /// fixed; there is deliberately no per-operation override.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ops: HashMap::new(),
            // A zero TTL would violate expires_at > created_at.
            ttl: Duration::seconds(ttl_secs.max(1) as i64),
        }
    }

    /// Registry with the default one-hour window.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }

    /// The configured negotiation window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a new pending operation and return its id.
    pub fn create(
        &mut self,
        tool_name: &str,
        kind: &str,
        args: Map<String, Value>,
        preview: &str,
    ) -> Uuid {
        self.create_at(tool_name, kind, args, preview, Utc::now())
    }

    pub(crate) fn create_at(
        &mut self,
        tool_name: &str,
        kind: &str,
        args: Map<String, Value>,
        preview: &str,
        now: DateTime<Utc>,
    ) -> Uuid {
        let op = PendingOperation::new_at(tool_name, kind, args, preview, now, self.ttl);
        let id = op.operation_id;
        tracing::info!(operation_id = %id, tool = tool_name, "registered pending operation");
        self.ops.insert(id, op);
        id
    }

    /// Look up a pending operation. Expired entries read as absent.
    pub fn get(&self, id: Uuid) -> Option<&PendingOperation> {
        self.get_at(id, Utc::now())
    }

    pub(crate) fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<&PendingOperation> {
        self.ops.get(&id).filter(|op| !op.is_expired_at(now))
    }

    /// Replace an operation's args and preview in place. Returns false for
    /// unknown or expired ids. `expires_at` is never touched: revision
    /// must not extend the negotiation window.
    pub fn update(&mut self, id: Uuid, new_args: Map<String, Value>, new_preview: &str) -> bool {
        self.update_at(id, new_args, new_preview, Utc::now())
    }

    pub(crate) fn update_at(
        &mut self,
        id: Uuid,
        new_args: Map<String, Value>,
        new_preview: &str,
        now: DateTime<Utc>,
    ) -> bool {
        match self.ops.get_mut(&id).filter(|op| !op.is_expired_at(now)) {
            Some(op) => {
                op.args = new_args;
                op.preview = new_preview.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove an operation. Idempotent: absent ids are not an error.
    pub fn remove(&mut self, id: Uuid) {
        if self.ops.remove(&id).is_some() {
            tracing::debug!(operation_id = %id, "removed pending operation");
        }
    }

    /// Remove and return an operation, honoring lazy expiry. An expired
    /// entry is dropped and reads as absent.
    pub fn take(&mut self, id: Uuid) -> Option<PendingOperation> {
        self.take_at(id, Utc::now())
    }

    pub(crate) fn take_at(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<PendingOperation> {
        let op = self.ops.remove(&id)?;
        if op.is_expired_at(now) {
            None
        } else {
            Some(op)
        }
    }

    /// Evict every entry whose window has closed. Returns the count.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub(crate) fn sweep_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.ops.len();
        self.ops.retain(|_, op| !op.is_expired_at(now));
        let evicted = before - self.ops.len();
        if evicted > 0 {
            tracing::info!(evicted, "swept expired pending operations");
        }
        evicted
    }

    /// Unexpired operations, newest first.
    pub fn list(&self) -> Vec<&PendingOperation> {
        self.list_at(Utc::now())
    }

    pub(crate) fn list_at(&self, now: DateTime<Utc>) -> Vec<&PendingOperation> {
        let mut pending: Vec<&PendingOperation> = self
            .ops
            .values()
            .filter(|op| !op.is_expired_at(now))
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
