// dispatcher.rs — DecisionDispatcher: the confirm / cancel / revise state
// machine over pending operations.
//
// States: PENDING (registered) → CONFIRMED or CANCELLED (terminal, entity
// removed in the same step), or PENDING again after a revise with
// refreshed args and preview. Every outcome is explicit; no branch
// swallows an error.

use serde::Serialize;
use uuid::Uuid;

use crate::execute::{Execution, ExecutionAdapter};
use crate::merge;
use crate::preview;
use crate::registry::OperationRegistry;

/// Operator decision actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Confirm,
    Cancel,
    Revise,
}

impl DecisionAction {
    /// Parse the wire action string; anything else is invalid input.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirm" => Some(Self::Confirm),
            "cancel" => Some(Self::Cancel),
            "revise" => Some(Self::Revise),
            _ => None,
        }
    }
}

/// Outcome of handling an operator decision.
///
/// Serializes to the protocol's wire shapes: a `status` tag plus, for
/// confirmed outcomes, either `result` (local) or `delegation`
/// (delegated), and for revised outcomes the unchanged `operationId`
/// with the refreshed preview.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Unknown or expired operation id. No side effect.
    NotFound,

    /// The operation was discarded without touching the tracker.
    Cancelled,

    /// Execution succeeded, locally or by delegation.
    Confirmed {
        #[serde(flatten)]
        execution: Execution,
    },

    /// Execution failed. The operation is consumed regardless: a confirm
    /// is one-shot, and retrying a failed side-effecting call risks
    /// duplicating an external effect.
    Error { message: String },

    /// The operation was amended and stays pending under the same id.
    Revised {
        #[serde(rename = "operationId")]
        operation_id: Uuid,
        preview: String,
    },

    /// Bad action value, missing revision input, or a tool with no
    /// revision rule. No state change; the caller may retry.
    Invalid { message: String },
}

/// The protocol state machine. Owns the execution adapter; the registry
/// is passed in per call so one process-wide instance can be shared
/// behind whatever serialization the host uses.
pub struct DecisionDispatcher {
    adapter: ExecutionAdapter,
}

impl DecisionDispatcher {
    pub fn new(adapter: ExecutionAdapter) -> Self {
        Self { adapter }
    }

    /// Handle one operator decision.
    pub fn handle(
        &self,
        registry: &mut OperationRegistry,
        operation_id: &str,
        action: &str,
        revision_input: Option<&str>,
    ) -> DecisionOutcome {
        let Some(action) = DecisionAction::parse(action) else {
            return DecisionOutcome::Invalid {
                message: format!(
                    "unknown action '{}': expected confirm, cancel, or revise",
                    action
                ),
            };
        };
        // Ids are opaque tokens we issued; anything unparseable was never issued.
        let Ok(id) = Uuid::parse_str(operation_id) else {
            return DecisionOutcome::NotFound;
        };

        match action {
            DecisionAction::Confirm => self.confirm(registry, id),
            DecisionAction::Cancel => self.cancel(registry, id),
            DecisionAction::Revise => {
                match revision_input.map(str::trim).filter(|s| !s.is_empty()) {
                    Some(input) => self.revise(registry, id, input),
                    None => DecisionOutcome::Invalid {
                        message: "revise requires a non-empty revisionInput".to_string(),
                    },
                }
            }
        }
    }

    fn confirm(&self, registry: &mut OperationRegistry, id: Uuid) -> DecisionOutcome {
        let Some(op) = registry.get(id).cloned() else {
            return DecisionOutcome::NotFound;
        };
        tracing::info!(operation_id = %id, tool = %op.tool_name, "confirming operation");

        let outcome = match self.adapter.execute(&op) {
            Ok(execution) => DecisionOutcome::Confirmed { execution },
            Err(e) => {
                tracing::warn!(operation_id = %id, error = %e, "confirm execution failed");
                DecisionOutcome::Error {
                    message: e.to_string(),
                }
            }
        };
        // Consumed exactly once, even when execution failed.
        registry.remove(id);
        outcome
    }

    fn cancel(&self, registry: &mut OperationRegistry, id: Uuid) -> DecisionOutcome {
        match registry.take(id) {
            Some(op) => {
                tracing::info!(operation_id = %id, tool = %op.tool_name, "operation cancelled");
                DecisionOutcome::Cancelled
            }
            None => DecisionOutcome::NotFound,
        }
    }

    fn revise(&self, registry: &mut OperationRegistry, id: Uuid, input: &str) -> DecisionOutcome {
        let Some(op) = registry.get(id) else {
            return DecisionOutcome::NotFound;
        };
        let tool_name = op.tool_name.clone();
        let mut args = op.args.clone();

        if let Err(e) = merge::merge_revision(&tool_name, &mut args, input) {
            // Operation unchanged and still pending; the caller may retry.
            return DecisionOutcome::Invalid {
                message: e.to_string(),
            };
        }

        let new_preview = preview::render(&tool_name, &args);
        if !registry.update(id, args, &new_preview) {
            return DecisionOutcome::NotFound;
        }
        tracing::info!(operation_id = %id, tool = %tool_name, "operation revised");
        DecisionOutcome::Revised {
            operation_id: id,
            preview: new_preview,
        }
    }
}

impl DecisionOutcome {
    /// Convenience for tests and logging.
    pub fn status(&self) -> &'static str {
        match self {
            DecisionOutcome::NotFound => "not_found",
            DecisionOutcome::Cancelled => "cancelled",
            DecisionOutcome::Confirmed { .. } => "confirmed",
            DecisionOutcome::Error { .. } => "error",
            DecisionOutcome::Revised { .. } => "revised",
            DecisionOutcome::Invalid { .. } => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_tracker::MemoryTracker;
    use serde_json::{json, Map, Value};

    use crate::merge::REVISION_SEPARATOR;
    use crate::tools;

    fn fixture() -> (OperationRegistry, DecisionDispatcher) {
        let registry = OperationRegistry::with_default_ttl();
        let dispatcher =
            DecisionDispatcher::new(ExecutionAdapter::new(Box::new(MemoryTracker::new())));
        (registry, dispatcher)
    }

    fn failing_fixture() -> (OperationRegistry, DecisionDispatcher) {
        let registry = OperationRegistry::with_default_ttl();
        let tracker = MemoryTracker::new();
        tracker.fail_with("remote unavailable");
        let dispatcher = DecisionDispatcher::new(ExecutionAdapter::new(Box::new(tracker)));
        (registry, dispatcher)
    }

    fn propose_issue(registry: &mut OperationRegistry, text: &str) -> Uuid {
        let mut args = Map::new();
        args.insert("initialInput".into(), json!(text));
        let preview = crate::preview::render(tools::ISSUE_CREATE_SIMPLE, &args);
        registry.create(tools::ISSUE_CREATE_SIMPLE, "issue_creation", args, &preview)
    }

    fn propose_pr(registry: &mut OperationRegistry) -> Uuid {
        let mut args = Map::new();
        args.insert("title".into(), json!("Fix login race"));
        args.insert("head".into(), json!("fix/login-race"));
        args.insert("base".into(), json!("main"));
        args.insert("body".into(), json!("Serialize the session refresh."));
        let preview = crate::preview::render(tools::PR_CREATE, &args);
        registry.create(tools::PR_CREATE, "pull_request", args, &preview)
    }

    #[test]
    fn confirm_executes_and_consumes_the_operation() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        let DecisionOutcome::Confirmed { execution } = outcome else {
            panic!("expected confirmed");
        };
        let Execution::Local { result } = execution else {
            panic!("expected local result");
        };
        assert_eq!(result["issue"]["title"], "Add dark mode");
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn second_confirm_reports_not_found() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        assert_eq!(outcome.status(), "not_found");
    }

    #[test]
    fn failed_confirm_still_consumes_the_operation() {
        let (mut registry, dispatcher) = failing_fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        assert_eq!(outcome.status(), "error");
        assert!(registry.get(id).is_none());

        let again = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        assert_eq!(again.status(), "not_found");
    }

    #[test]
    fn confirm_of_delegated_tool_returns_descriptor() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_pr(&mut registry);

        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        let DecisionOutcome::Confirmed { execution } = outcome else {
            panic!("expected confirmed");
        };
        let Execution::Delegated { delegation } = execution else {
            panic!("expected delegation descriptor");
        };
        assert_eq!(delegation.tool, "github_create_pull_request");
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn cancel_discards_without_executing() {
        let (mut registry, dispatcher) = failing_fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        // A failing tracker would turn any execution into an error outcome;
        // cancel must not produce one.
        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "cancel", None);
        assert_eq!(outcome.status(), "cancelled");
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn cancel_twice_reports_not_found_second_time() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        let first = dispatcher.handle(&mut registry, &id.to_string(), "cancel", None);
        assert_eq!(first.status(), "cancelled");
        let second = dispatcher.handle(&mut registry, &id.to_string(), "cancel", None);
        assert_eq!(second.status(), "not_found");
    }

    #[test]
    fn revise_updates_preview_and_keeps_identity() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");
        let expires_before = registry.get(id).unwrap().expires_at;

        let outcome = dispatcher.handle(
            &mut registry,
            &id.to_string(),
            "revise",
            Some("Also support light theme"),
        );
        let DecisionOutcome::Revised {
            operation_id,
            preview,
        } = outcome
        else {
            panic!("expected revised");
        };
        assert_eq!(operation_id, id);
        assert!(preview.contains("Also support light theme"));

        let op = registry.get(id).unwrap();
        assert_eq!(op.preview, preview);
        assert!(op.args["initialInput"]
            .as_str()
            .unwrap()
            .contains(REVISION_SEPARATOR));
        assert_eq!(op.expires_at, expires_before);
    }

    #[test]
    fn revised_operation_confirms_with_merged_args() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        dispatcher.handle(
            &mut registry,
            &id.to_string(),
            "revise",
            Some("Also support light theme"),
        );
        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "confirm", None);
        let DecisionOutcome::Confirmed {
            execution: Execution::Local { result },
        } = outcome
        else {
            panic!("expected local confirm");
        };
        // Title still derives from the first line of the original text.
        assert_eq!(result["issue"]["title"], "Add dark mode");
    }

    #[test]
    fn revise_unknown_id_reports_not_found() {
        let (mut registry, dispatcher) = fixture();
        let outcome = dispatcher.handle(
            &mut registry,
            &Uuid::new_v4().to_string(),
            "revise",
            Some("x"),
        );
        assert_eq!(outcome.status(), "not_found");
    }

    #[test]
    fn revise_without_input_is_invalid() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        for input in [None, Some(""), Some("   ")] {
            let outcome = dispatcher.handle(&mut registry, &id.to_string(), "revise", input);
            assert_eq!(outcome.status(), "invalid");
        }
        // Still pending and unchanged.
        assert_eq!(registry.get(id).unwrap().args["initialInput"], "Add dark mode");
    }

    #[test]
    fn revise_of_structured_tool_is_invalid_and_preserves_entity() {
        let (mut registry, dispatcher) = fixture();
        let mut args = Map::new();
        args.insert("issueNumber".into(), json!(7));
        args.insert("title".into(), json!("New title"));
        let preview = crate::preview::render(tools::ISSUE_UPDATE, &args);
        let id = registry.create(tools::ISSUE_UPDATE, "issue_update", args, &preview);

        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "revise", Some("change it"));
        let DecisionOutcome::Invalid { message } = outcome else {
            panic!("expected invalid");
        };
        assert!(message.contains("no revision merge rule"));

        let op = registry.get(id).unwrap();
        assert_eq!(op.preview, preview);
        assert_eq!(op.args["title"], "New title");
    }

    #[test]
    fn unknown_action_is_invalid() {
        let (mut registry, dispatcher) = fixture();
        let id = propose_issue(&mut registry, "Add dark mode");

        let outcome = dispatcher.handle(&mut registry, &id.to_string(), "approve", None);
        assert_eq!(outcome.status(), "invalid");
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn malformed_id_reports_not_found() {
        let (mut registry, dispatcher) = fixture();
        let outcome = dispatcher.handle(&mut registry, "op-missing", "confirm", None);
        assert_eq!(outcome.status(), "not_found");
    }

    #[test]
    fn expired_operation_reports_not_found_on_every_action() {
        let (mut registry, dispatcher) = fixture();
        let mut args = Map::new();
        args.insert("initialInput".into(), json!("stale"));
        let id = registry.create_at(
            tools::ISSUE_CREATE_SIMPLE,
            "issue_creation",
            args,
            "p",
            chrono::Utc::now() - chrono::Duration::seconds(7200),
        );

        for (action, input) in [("confirm", None), ("cancel", None), ("revise", Some("x"))] {
            let outcome = dispatcher.handle(&mut registry, &id.to_string(), action, input);
            assert_eq!(outcome.status(), "not_found", "action {}", action);
        }
    }

    #[test]
    fn decisions_on_distinct_ids_are_independent() {
        let (mut registry, dispatcher) = fixture();
        let a = propose_issue(&mut registry, "First proposal");
        let b = propose_issue(&mut registry, "Second proposal");

        let cancelled = dispatcher.handle(&mut registry, &a.to_string(), "cancel", None);
        assert_eq!(cancelled.status(), "cancelled");

        // b is untouched by a's terminal transition.
        let op = registry.get(b).unwrap();
        assert_eq!(op.args["initialInput"], "Second proposal");
        let confirmed = dispatcher.handle(&mut registry, &b.to_string(), "confirm", None);
        assert_eq!(confirmed.status(), "confirmed");
    }

    #[test]
    fn outcome_wire_shapes_match_protocol() {
        let outcome = DecisionOutcome::NotFound;
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "status": "not_found" })
        );

        let outcome = DecisionOutcome::Revised {
            operation_id: Uuid::nil(),
            preview: "p".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "revised");
        assert!(json.get("operationId").is_some());

        let outcome = DecisionOutcome::Confirmed {
            execution: Execution::Local {
                result: json!({ "ok": true }),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["result"]["ok"], true);

        let outcome = DecisionOutcome::Confirmed {
            execution: Execution::Delegated {
                delegation: crate::execute::DelegatedCall {
                    tool: "github_create_pull_request".to_string(),
                    parameters: json!({}),
                },
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["delegation"]["tool"], "github_create_pull_request");
        assert!(json.get("result").is_none());
    }
}
