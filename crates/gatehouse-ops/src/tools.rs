// tools.rs — Canonical tool names routed through the gate.
//
// The tool name is the single routing key: it selects the execution
// strategy at confirm time and the merge rule at revise time.

/// Create an issue from one block of free text.
pub const ISSUE_CREATE_SIMPLE: &str = "issue:CreateSimple";

/// Update fields on an existing issue, optionally adding a comment.
pub const ISSUE_UPDATE: &str = "issue:Update";

/// Open a pull request (delegated to the host runtime).
pub const PR_CREATE: &str = "pr:Create";

/// Publish an analytics report as an issue comment (delegated).
pub const REPORT_PUBLISH: &str = "report:Publish";

/// Display category shown to the operator for each tool name.
pub fn kind_for(tool_name: &str) -> Option<&'static str> {
    match tool_name {
        ISSUE_CREATE_SIMPLE => Some("issue_creation"),
        ISSUE_UPDATE => Some("issue_update"),
        PR_CREATE => Some("pull_request"),
        REPORT_PUBLISH => Some("report"),
        _ => None,
    }
}
