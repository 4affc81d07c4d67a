//! exec-gateway Library
//!
//! This library provides the core of the command-execution gateway:
//! whitelist enforcement, shell-less process execution with timeouts, the
//! `execute_command` request boundary and the MCP server that exposes it.

pub mod config;
pub mod gateway;
pub mod mcp;
pub mod metrics;
pub mod metrics_server;
pub mod tools;

pub use config::GatewayConfig;
pub use gateway::{Gateway, EXECUTE_COMMAND};
pub use mcp::McpServer;
