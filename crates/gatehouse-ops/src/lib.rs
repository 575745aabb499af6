//! # gatehouse-ops
//!
//! The operation preview and confirmation core.
//!
//! Agents propose side-effecting actions against the remote tracker; each
//! proposal is registered as a [`PendingOperation`] with a human-readable
//! preview and a fixed time-to-live. Nothing reaches the remote system
//! until an operator decides: confirm executes the operation (directly or
//! by emitting a delegated call descriptor for the host runtime), cancel
//! discards it, and revise amends its arguments and re-renders the preview
//! while keeping the same identity and expiry.
//!
//! Components:
//! - [`OperationRegistry`] — the single source of truth mapping operation
//!   id to pending operation, with lazy TTL eviction.
//! - [`DecisionDispatcher`] — the confirm / cancel / revise state machine.
//! - [`ExecutionAdapter`] — routes a confirmed operation to a local
//!   tracker call or a delegated call descriptor, selected by tool name.
//! - [`preview`] — pure preview rendering.
//! - [`merge`] — per-tool revision merge rules.

pub mod dispatcher;
pub mod error;
pub mod execute;
pub mod merge;
pub mod operation;
pub mod preview;
pub mod registry;
pub mod tools;

pub use dispatcher::{DecisionAction, DecisionDispatcher, DecisionOutcome};
pub use error::OpsError;
pub use execute::{DelegatedCall, Execution, ExecutionAdapter, ExecutionStrategy};
pub use operation::PendingOperation;
pub use registry::OperationRegistry;
