//! # gatehouse-gateway
//!
//! MCP gateway server for Gatehouse.
//!
//! Exposes the confirmation protocol as MCP tools: proposers register
//! pending operations and hand the preview back to the operator, and
//! `gate_operation_decide` drives the confirm / cancel / revise state
//! machine. One [`GateState`] per process holds the operation registry;
//! the server serializes all access to it.

pub mod config;
pub mod error;
pub mod server;

pub use config::{GateConfig, TrackerSettings};
pub use error::GatewayError;
pub use server::{GateServer, GateState};
