// client.rs — TrackerClient: the seam to the remote collaboration system.
//
// All local executions of confirmed operations go through this trait so
// the backend can be swapped without touching the confirmation core:
// HttpTracker in production, MemoryTracker in tests and offline runs.

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// A new issue to create on the remote tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,

    /// Issue body (markdown).
    pub body: String,

    /// Labels to attach at creation time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Field updates for an existing issue. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl IssueUpdate {
    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// Reference to an issue on the remote tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRef {
    /// Tracker-assigned issue number.
    pub number: u64,

    /// Web URL of the issue.
    pub url: String,

    /// Title as stored on the tracker.
    pub title: String,
}

/// Reference to a comment on the remote tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRef {
    /// Tracker-assigned comment id.
    pub id: u64,

    /// Web URL of the comment.
    pub url: String,
}

/// Pluggable client for the remote collaboration system.
///
/// Implementations must be `Send + Sync`: the gateway shares one client
/// across all tool handlers behind its state mutex.
pub trait TrackerClient: Send + Sync {
    /// Create a new issue and return its tracker reference.
    fn create_issue(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError>;

    /// Update fields on an existing issue.
    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<IssueRef, TrackerError>;

    /// Add a comment to an existing issue.
    fn add_comment(&self, number: u64, body: &str) -> Result<CommentRef, TrackerError>;

    /// Client display name (for logs).
    fn name(&self) -> &str;
}
