//! # gatehouse-tracker
//!
//! Client seam to the remote collaboration system (issue tracker / PR host).
//!
//! The gateway never holds tracker credentials or transport logic itself;
//! everything goes through the [`TrackerClient`] trait. Two implementations
//! ship with the workspace:
//!
//! - [`HttpTracker`] — blocking REST client for a GitHub-style API.
//! - [`MemoryTracker`] — in-memory fake for tests and offline runs.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use client::{CommentRef, IssueRef, IssueUpdate, NewIssue, TrackerClient};
pub use error::TrackerError;
pub use http::{HttpTracker, HttpTrackerConfig};
pub use memory::MemoryTracker;
