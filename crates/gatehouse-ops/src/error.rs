// error.rs — Error types for the confirmation core.

use gatehouse_tracker::TrackerError;
use thiserror::Error;

/// Errors raised inside the confirmation core.
///
/// Lookup misses and bad decision input are not errors — the dispatcher
/// reports those directly as `not_found` / `invalid` outcomes. This enum
/// covers execution and revision-merge failures.
#[derive(Debug, Error)]
pub enum OpsError {
    /// No execution route is defined for the tool name.
    #[error("no execution route for tool '{0}'")]
    UnroutedTool(String),

    /// A required argument is missing or has the wrong shape.
    #[error("invalid arguments for {tool}: {message}")]
    BadArgs { tool: String, message: String },

    /// The tracker rejected or failed a local execution call.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// A multi-step local execution failed; sub-step diagnostics aggregated.
    #[error("execution failed: {}", .0.join("; "))]
    StepFailures(Vec<String>),

    /// No revision merge rule is defined for the tool name.
    #[error("no revision merge rule for tool '{0}': cancel and re-propose instead")]
    NoMergeRule(String),
}
