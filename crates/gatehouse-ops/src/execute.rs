// execute.rs — ExecutionAdapter: convert a confirmed operation into an effect.
//
// Strategy is selected purely by tool name:
//
// - Local: this process performs the mutation itself through the
//   TrackerClient and returns the tracker's result.
// - Delegated: this process holds no transport or credentials for the
//   mutation, so it returns a fully specified call descriptor that the
//   host runtime is contractually obligated to execute and report back.
//
// Local executions with multiple sub-steps never report partial success:
// any failing step fails the whole confirm, with sub-step diagnostics
// aggregated into the error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use gatehouse_tracker::{IssueUpdate, NewIssue, TrackerClient};

use crate::error::OpsError;
use crate::operation::PendingOperation;
use crate::preview::split_initial_input;
use crate::tools;

/// Which strategy executes a confirmed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Performed in-process through the tracker client.
    Local,
    /// Emitted as a call descriptor for the host runtime.
    Delegated,
}

/// A fully specified call for the host runtime to execute on our behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegatedCall {
    /// Name of the host-side tool to invoke.
    pub tool: String,

    /// Complete parameter object for that tool.
    pub parameters: Value,
}

/// Outcome of executing a confirmed operation.
///
/// Untagged on the wire so a local confirm carries `result` and a
/// delegated confirm carries `delegation`, exactly one of the two.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Execution {
    Local { result: Value },
    Delegated { delegation: DelegatedCall },
}

impl Execution {
    /// The strategy that produced this outcome.
    pub fn strategy(&self) -> ExecutionStrategy {
        match self {
            Execution::Local { .. } => ExecutionStrategy::Local,
            Execution::Delegated { .. } => ExecutionStrategy::Delegated,
        }
    }
}

/// Routes confirmed operations to the tracker or to the host runtime.
pub struct ExecutionAdapter {
    tracker: Box<dyn TrackerClient>,
}

impl ExecutionAdapter {
    pub fn new(tracker: Box<dyn TrackerClient>) -> Self {
        Self { tracker }
    }

    /// Strategy for a tool name; `None` when the gate has no route for it.
    /// Total and deterministic: two operations sharing a tool name always
    /// share a strategy.
    pub fn strategy_for(tool_name: &str) -> Option<ExecutionStrategy> {
        match tool_name {
            tools::ISSUE_CREATE_SIMPLE | tools::ISSUE_UPDATE => Some(ExecutionStrategy::Local),
            tools::PR_CREATE | tools::REPORT_PUBLISH => Some(ExecutionStrategy::Delegated),
            _ => None,
        }
    }

    /// Execute a confirmed operation.
    pub fn execute(&self, op: &PendingOperation) -> Result<Execution, OpsError> {
        match Self::strategy_for(&op.tool_name) {
            None => Err(OpsError::UnroutedTool(op.tool_name.clone())),
            Some(ExecutionStrategy::Local) => self.execute_local(op),
            Some(ExecutionStrategy::Delegated) => Ok(Execution::Delegated {
                delegation: delegated_call(op)?,
            }),
        }
    }

    fn execute_local(&self, op: &PendingOperation) -> Result<Execution, OpsError> {
        match op.tool_name.as_str() {
            tools::ISSUE_CREATE_SIMPLE => self.create_simple_issue(op),
            tools::ISSUE_UPDATE => self.update_issue(op),
            other => Err(OpsError::UnroutedTool(other.to_string())),
        }
    }

    fn create_simple_issue(&self, op: &PendingOperation) -> Result<Execution, OpsError> {
        let text = require_str(op, "initialInput")?;
        let (title, body) = split_initial_input(text);
        let issue = self.tracker.create_issue(&NewIssue {
            title,
            body,
            labels: Vec::new(),
        })?;
        tracing::info!(number = issue.number, "issue created via {}", self.tracker.name());
        Ok(Execution::Local {
            result: json!({
                "issue": { "number": issue.number, "url": issue.url, "title": issue.title },
            }),
        })
    }

    /// Two-step mutation: field update, then optional comment. The second
    /// step is skipped once the first fails so a failed confirm never
    /// leaves extra external effects behind.
    fn update_issue(&self, op: &PendingOperation) -> Result<Execution, OpsError> {
        let number = require_u64(op, "issueNumber")?;
        let update = IssueUpdate {
            title: optional_str(op, "title"),
            body: optional_str(op, "body"),
        };
        let comment = optional_str(op, "comment");
        if update.is_empty() && comment.is_none() {
            return Err(OpsError::BadArgs {
                tool: op.tool_name.clone(),
                message: "nothing to change: provide title, body, or comment".to_string(),
            });
        }

        let mut result = Map::new();
        if !update.is_empty() {
            match self.tracker.update_issue(number, &update) {
                Ok(issue) => {
                    result.insert(
                        "issue".to_string(),
                        json!({ "number": issue.number, "url": issue.url, "title": issue.title }),
                    );
                }
                Err(e) => {
                    let mut failures = vec![format!("field update failed: {}", e)];
                    if comment.is_some() {
                        failures.push("comment skipped".to_string());
                    }
                    return Err(OpsError::StepFailures(failures));
                }
            }
        }
        if let Some(text) = comment {
            match self.tracker.add_comment(number, &text) {
                Ok(c) => {
                    result.insert("comment".to_string(), json!({ "id": c.id, "url": c.url }));
                }
                Err(e) => {
                    let mut failures = vec![format!("comment failed: {}", e)];
                    if !update.is_empty() {
                        failures.push("field update already applied".to_string());
                    }
                    return Err(OpsError::StepFailures(failures));
                }
            }
        }
        Ok(Execution::Local {
            result: Value::Object(result),
        })
    }
}

/// Build the call descriptor for a delegated tool.
fn delegated_call(op: &PendingOperation) -> Result<DelegatedCall, OpsError> {
    match op.tool_name.as_str() {
        tools::PR_CREATE => {
            let title = require_str(op, "title")?;
            let head = require_str(op, "head")?;
            let base = require_str(op, "base")?;
            let body = optional_str(op, "body").unwrap_or_default();
            Ok(DelegatedCall {
                tool: "github_create_pull_request".to_string(),
                parameters: json!({ "title": title, "head": head, "base": base, "body": body }),
            })
        }
        tools::REPORT_PUBLISH => {
            let number = require_u64(op, "issueNumber")?;
            let body = require_str(op, "body")?;
            Ok(DelegatedCall {
                tool: "github_add_issue_comment".to_string(),
                parameters: json!({ "issue_number": number, "body": body }),
            })
        }
        other => Err(OpsError::UnroutedTool(other.to_string())),
    }
}

fn require_str<'a>(op: &'a PendingOperation, key: &str) -> Result<&'a str, OpsError> {
    op.args
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| OpsError::BadArgs {
            tool: op.tool_name.clone(),
            message: format!("missing required field '{}'", key),
        })
}

fn require_u64(op: &PendingOperation, key: &str) -> Result<u64, OpsError> {
    op.args
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| OpsError::BadArgs {
            tool: op.tool_name.clone(),
            message: format!("missing required numeric field '{}'", key),
        })
}

fn optional_str(op: &PendingOperation, key: &str) -> Option<String> {
    op.args
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}
