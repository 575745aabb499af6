// server.rs — MCP gateway server for Gatehouse.
//
// GateServer implements the rmcp ServerHandler trait, exposing the
// confirmation protocol as MCP tools. Proposer tools register a pending
// operation and return its preview; nothing touches the remote tracker
// until the operator decides through gate_operation_decide.
//
// Tools (prefixed `gate_` for namespacing):
//   gate_issue_propose        — propose creating an issue from free text
//   gate_issue_update_propose — propose updating an issue's fields/comment
//   gate_pr_propose           — propose opening a pull request (delegated)
//   gate_report_propose       — propose publishing a report comment (delegated)
//   gate_operation_decide     — confirm / cancel / revise a pending operation
//   gate_operation_list       — list pending operations, newest first

use std::sync::{Arc, Mutex};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use gatehouse_ops::{
    preview, tools, DecisionDispatcher, ExecutionAdapter, OperationRegistry,
};
use gatehouse_tracker::{HttpTracker, MemoryTracker, TrackerClient};

use crate::config::GateConfig;
use crate::error::GatewayError;

// ── Tool parameter types ─────────────────────────────────────────

/// Parameters for `gate_issue_propose`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueProposeParams {
    /// Free-text description of the issue. The first line becomes the title.
    pub text: String,
}

/// Parameters for `gate_issue_update_propose`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateProposeParams {
    /// Number of the issue to update.
    pub issue_number: u64,
    /// New title, if the title should change.
    pub title: Option<String>,
    /// New body, if the body should change.
    pub body: Option<String>,
    /// Comment to add alongside the update.
    pub comment: Option<String>,
}

/// Parameters for `gate_pr_propose`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrProposeParams {
    /// Pull request title.
    pub title: String,
    /// Source branch.
    pub head: String,
    /// Target branch.
    pub base: String,
    /// Pull request description (markdown).
    pub body: Option<String>,
}

/// Parameters for `gate_report_propose`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportProposeParams {
    /// Issue the report is published on.
    pub issue_number: u64,
    /// Report body (markdown).
    pub body: String,
}

/// Parameters for `gate_operation_decide`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideParams {
    /// Id of the pending operation, as returned by a propose tool.
    pub operation_id: String,
    /// One of "confirm", "cancel", or "revise".
    pub action: String,
    /// Amendment text; required for "revise".
    pub revision_input: Option<String>,
}

// ── Gateway state ────────────────────────────────────────────────

/// Shared mutable state for the gate server.
///
/// The registry is the process-wide single source of truth for pending
/// operations; every mutation routes through it while the server's mutex
/// is held, so a sweep and a revise can never race on the same entry.
pub struct GateState {
    pub config: GateConfig,
    pub registry: OperationRegistry,
    pub dispatcher: DecisionDispatcher,
}

impl GateState {
    pub fn new(config: GateConfig, tracker: Box<dyn TrackerClient>) -> Self {
        let registry = OperationRegistry::new(config.ttl_secs);
        let dispatcher = DecisionDispatcher::new(ExecutionAdapter::new(tracker));
        Self {
            config,
            registry,
            dispatcher,
        }
    }

    /// Register a pending operation and build the propose response.
    /// Sweeps opportunistically so expired entries never pile up between
    /// timer ticks.
    pub fn propose(&mut self, tool_name: &str, args: Map<String, Value>) -> Value {
        self.registry.sweep();

        let kind = tools::kind_for(tool_name).unwrap_or("operation");
        let preview = preview::render(tool_name, &args);
        let id = self.registry.create(tool_name, kind, args, &preview);
        let expires_at = self
            .registry
            .get(id)
            .map(|op| op.expires_at.to_rfc3339());

        json!({
            "operationId": id.to_string(),
            "type": kind,
            "preview": preview,
            "expiresAt": expires_at,
            "message": "Operation registered. Show the preview to the operator and decide with gate_operation_decide.",
        })
    }

    /// Drive the decision state machine and return the wire outcome.
    pub fn decide(
        &mut self,
        operation_id: &str,
        action: &str,
        revision_input: Option<&str>,
    ) -> Value {
        let outcome =
            self.dispatcher
                .handle(&mut self.registry, operation_id, action, revision_input);
        serde_json::to_value(&outcome).unwrap_or_else(|e| {
            json!({ "status": "error", "message": format!("failed to encode outcome: {}", e) })
        })
    }

    /// Pending operations, newest first.
    pub fn pending(&self) -> Value {
        let items: Vec<Value> = self
            .registry
            .list()
            .iter()
            .map(|op| {
                json!({
                    "operationId": op.operation_id.to_string(),
                    "toolName": op.tool_name,
                    "type": op.kind,
                    "preview": op.preview,
                    "createdAt": op.created_at.to_rfc3339(),
                    "expiresAt": op.expires_at.to_rfc3339(),
                })
            })
            .collect();
        json!({ "operations": items, "count": items.len() })
    }
}

// ── MCP Server ───────────────────────────────────────────────────

/// The MCP gate server. Holds shared state and the tool router.
pub struct GateServer {
    state: Arc<Mutex<GateState>>,
    tool_router: ToolRouter<Self>,
}

// Tool definitions. Each `#[tool]` method becomes an MCP tool that the
// agent client can call.
#[tool_router]
impl GateServer {
    /// Create a server talking to the real tracker over HTTP.
    pub fn new(config: GateConfig) -> Result<Self, GatewayError> {
        let tracker = HttpTracker::new(config.tracker.clone().into())?;
        Ok(Self::with_tracker(config, Box::new(tracker)))
    }

    /// Create a server backed by the in-memory tracker (tests, --offline).
    pub fn offline(config: GateConfig) -> Self {
        Self::with_tracker(config, Box::new(MemoryTracker::new()))
    }

    /// Create a server with an explicit tracker client.
    pub fn with_tracker(config: GateConfig, tracker: Box<dyn TrackerClient>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::new(config, tracker))),
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the shared state (sweep task, tests).
    pub fn state(&self) -> &Arc<Mutex<GateState>> {
        &self.state
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, GateState>, McpError> {
        self.state
            .lock()
            .map_err(|e| McpError::internal_error(format!("lock poisoned: {}", e), None))
    }

    // ── Proposer tools ───────────────────────────────────────

    #[tool(
        description = "Propose creating an issue from free text. Registers a pending operation and returns its preview; nothing is created until the operator confirms via gate_operation_decide."
    )]
    fn gate_issue_propose(
        &self,
        Parameters(params): Parameters<IssueProposeParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.text.trim().is_empty() {
            return Err(McpError::invalid_params("text must not be empty", None));
        }
        let mut state = self.lock_state()?;
        let mut args = Map::new();
        args.insert("initialInput".to_string(), json!(params.text));
        let response = state.propose(tools::ISSUE_CREATE_SIMPLE, args);
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }

    #[tool(
        description = "Propose updating an existing issue (title/body) and optionally adding a comment. Requires operator confirmation before anything changes."
    )]
    fn gate_issue_update_propose(
        &self,
        Parameters(params): Parameters<IssueUpdateProposeParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.title.is_none() && params.body.is_none() && params.comment.is_none() {
            return Err(McpError::invalid_params(
                "provide at least one of title, body, or comment",
                None,
            ));
        }
        let mut state = self.lock_state()?;
        let mut args = Map::new();
        args.insert("issueNumber".to_string(), json!(params.issue_number));
        if let Some(title) = params.title {
            args.insert("title".to_string(), json!(title));
        }
        if let Some(body) = params.body {
            args.insert("body".to_string(), json!(body));
        }
        if let Some(comment) = params.comment {
            args.insert("comment".to_string(), json!(comment));
        }
        let response = state.propose(tools::ISSUE_UPDATE, args);
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }

    #[tool(
        description = "Propose opening a pull request. On confirmation the gate returns a delegated call descriptor for the host runtime to execute."
    )]
    fn gate_pr_propose(
        &self,
        Parameters(params): Parameters<PrProposeParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.lock_state()?;
        let mut args = Map::new();
        args.insert("title".to_string(), json!(params.title));
        args.insert("head".to_string(), json!(params.head));
        args.insert("base".to_string(), json!(params.base));
        args.insert(
            "body".to_string(),
            json!(params.body.unwrap_or_default()),
        );
        let response = state.propose(tools::PR_CREATE, args);
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }

    #[tool(
        description = "Propose publishing a report as a comment on a tracking issue. On confirmation the gate returns a delegated call descriptor for the host runtime."
    )]
    fn gate_report_propose(
        &self,
        Parameters(params): Parameters<ReportProposeParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.body.trim().is_empty() {
            return Err(McpError::invalid_params("body must not be empty", None));
        }
        let mut state = self.lock_state()?;
        let mut args = Map::new();
        args.insert("issueNumber".to_string(), json!(params.issue_number));
        args.insert("body".to_string(), json!(params.body));
        let response = state.propose(tools::REPORT_PUBLISH, args);
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }

    // ── Decision tools ───────────────────────────────────────

    #[tool(
        description = "Relay the operator's decision on a pending operation: confirm executes it, cancel discards it, revise amends it with revisionInput and returns an updated preview."
    )]
    fn gate_operation_decide(
        &self,
        Parameters(params): Parameters<DecideParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.lock_state()?;
        let response = state.decide(
            &params.operation_id,
            &params.action,
            params.revision_input.as_deref(),
        );
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }

    #[tool(description = "List pending operations awaiting an operator decision, newest first.")]
    fn gate_operation_list(&self) -> Result<CallToolResult, McpError> {
        let state = self.lock_state()?;
        let response = state.pending();
        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|e| {
                McpError::internal_error(e.to_string(), None)
            })?]))
    }
}

// ── ServerHandler implementation ─────────────────────────────────

#[tool_handler]
impl ServerHandler for GateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gatehouse".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Gatehouse".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Gatehouse confirmation gateway. Side-effecting tracker \
                 operations are registered as pending proposals with a \
                 preview and require operator approval. Propose with the \
                 gate_*_propose tools, show the preview, then call \
                 gate_operation_decide with confirm, cancel, or revise. \
                 Pending proposals expire after the configured TTL."
                    .into(),
            ),
        }
    }
}
