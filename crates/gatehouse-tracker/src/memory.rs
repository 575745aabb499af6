// memory.rs — MemoryTracker: in-memory tracker fake.
//
// Used by tests and by `gatehouse-daemon --offline`. Issues live in a
// Mutex-guarded Vec; a failure switch lets dispatcher tests exercise the
// execution-failure path without a network.

use std::sync::Mutex;

use crate::client::{CommentRef, IssueRef, IssueUpdate, NewIssue, TrackerClient};
use crate::error::TrackerError;

#[derive(Debug, Clone)]
struct StoredIssue {
    number: u64,
    title: String,
    body: String,
    comments: Vec<String>,
}

#[derive(Default)]
struct State {
    issues: Vec<StoredIssue>,
    next_number: u64,
    next_comment_id: u64,
    fail_with: Option<String>,
}

/// In-memory tracker backend.
pub struct MemoryTracker {
    state: Mutex<State>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_number: 1,
                next_comment_id: 1,
                ..State::default()
            }),
        }
    }

    /// Make every subsequent call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().fail_with = Some(message.into());
    }

    /// Clear a previously set failure.
    pub fn recover(&self) {
        self.lock().fail_with = None;
    }

    /// Number of issues currently stored.
    pub fn issue_count(&self) -> usize {
        self.lock().issues.len()
    }

    /// Comments recorded on an issue, in order.
    pub fn comments(&self, number: u64) -> Vec<String> {
        self.lock()
            .issues
            .iter()
            .find(|i| i.number == number)
            .map(|i| i.comments.clone())
            .unwrap_or_default()
    }

    /// Seed an issue directly (test setup).
    pub fn seed_issue(&self, title: &str, body: &str) -> u64 {
        let mut state = self.lock();
        let number = state.next_number;
        state.next_number += 1;
        state.issues.push(StoredIssue {
            number,
            title: title.to_string(),
            body: body.to_string(),
            comments: Vec::new(),
        });
        number
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock in the fake means a test already panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(state: &State) -> Result<(), TrackerError> {
        match &state.fail_with {
            Some(message) => Err(TrackerError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn url_for(number: u64) -> String {
        format!("memory://issues/{}", number)
    }
}

impl Default for MemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerClient for MemoryTracker {
    fn create_issue(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let number = state.next_number;
        state.next_number += 1;
        state.issues.push(StoredIssue {
            number,
            title: issue.title.clone(),
            body: issue.body.clone(),
            comments: Vec::new(),
        });
        Ok(IssueRef {
            number,
            url: Self::url_for(number),
            title: issue.title.clone(),
        })
    }

    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<IssueRef, TrackerError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or(TrackerError::UnknownIssue(number))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        Ok(IssueRef {
            number,
            url: Self::url_for(number),
            title: issue.title.clone(),
        })
    }

    fn add_comment(&self, number: u64, body: &str) -> Result<CommentRef, TrackerError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let id = state.next_comment_id;
        state.next_comment_id += 1;
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or(TrackerError::UnknownIssue(number))?;
        issue.comments.push(body.to_string());
        Ok(CommentRef {
            id,
            url: format!("memory://issues/{}/comments/{}", number, id),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
