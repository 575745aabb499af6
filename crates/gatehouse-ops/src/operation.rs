// operation.rs — PendingOperation: a proposed mutation awaiting confirmation.
//
// Created when a proposer registers a side-effecting action; destroyed by
// confirm, cancel, or TTL expiry. `args` and `preview` always move
// together through the revise path; everything else is fixed at creation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored proposal for a side-effecting action awaiting operator
/// confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    /// Opaque unique token, generated at creation. Never reused.
    pub operation_id: Uuid,

    /// The requested mutation kind. Selects the execution strategy at
    /// confirm time and the merge rule at revise time. Immutable.
    pub tool_name: String,

    /// Display category shown to the operator (e.g. "issue_creation").
    #[serde(rename = "type")]
    pub kind: String,

    /// Proposed mutation parameters. Replaced wholesale on revise.
    #[serde(rename = "originalArgs")]
    pub args: Map<String, Value>,

    /// Last rendered preview. Always reflects the current `args`.
    #[serde(rename = "previewText")]
    pub preview: String,

    /// When the proposal was registered.
    pub created_at: DateTime<Utc>,

    /// End of the negotiation window: `created_at + TTL`, fixed at
    /// creation. Revision never extends it.
    pub expires_at: DateTime<Utc>,
}

impl PendingOperation {
    pub(crate) fn new_at(
        tool_name: impl Into<String>,
        kind: impl Into<String>,
        args: Map<String, Value>,
        preview: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            kind: kind.into(),
            args,
            preview: preview.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// True when the negotiation window has closed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
