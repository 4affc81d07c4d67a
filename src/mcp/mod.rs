//! MCP (Model Context Protocol) Server Implementation
//!
//! This module exposes the gateway to AI agents over MCP, built directly on
//! Tokio and Serde (no external SDK).
//!
//! # Architecture
//!
//! 1. **Protocol Layer** (`protocol`): JSON-RPC 2.0 message types
//! 2. **Server Layer** (`server`): stdio framing, dispatch and concurrency

// Protocol layer: JSON-RPC 2.0 message types
pub mod protocol;

// Server layer: newline-delimited JSON-RPC over stdio
pub mod server;

pub use protocol::{
    InitializeResult, McpError, McpMethod, McpRequest, McpResponse, ServerInfo, Tool,
    ToolCallParams, ToolCallResult, ToolContent,
};
pub use server::McpServer;
