//! MCP Server
//!
//! This module serves the gateway to an AI agent as an MCP server speaking
//! newline-delimited JSON-RPC 2.0.
//!
//! # Architecture
//!
//! ```text
//! Agent (MCP client)
//!      ↓ (JSON-RPC over stdin/stdout)
//! McpServer (this module)
//!      ↓
//! Gateway → ProcessExecutor → child process
//! ```
//!
//! # Protocol
//!
//! - `initialize`: handshake, advertises the `tools` capability
//! - `notifications/initialized`: acknowledged silently
//! - `ping`: liveness check
//! - `tools/list`: lists `execute_command`
//! - `tools/call`: runs `execute_command`
//!
//! Each request is handled in its own task, so a long-running command does not
//! hold up other requests. Responses are written by a single writer task in
//! completion order.

use super::protocol::{
    InitializeResult, McpError, McpMethod, McpRequest, McpResponse, ServerInfo, ToolCallParams,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::gateway::Gateway;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "exec-gateway";

/// MCP server exposing a [`Gateway`]
#[derive(Debug, Clone)]
pub struct McpServer {
    gateway: Arc<Gateway>,
}

impl McpServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`
    ///
    /// Returns once `reader` reaches EOF and every in-flight request has been
    /// answered.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the transport fails.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("MCP server ready to receive requests");

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let server = Arc::new(self);
        let mut in_flight = JoinSet::new();
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read from transport")?;
            if read == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!("Received a line that is not valid UTF-8: {}", e);
                    let response = McpResponse::err(
                        Value::Null,
                        McpError::parse_error(format!("Parse error: {}", e)),
                    );
                    send_response(&tx, &response);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            let server = server.clone();
            let tx = tx.clone();
            let line = line.to_string();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_message(&line).await {
                    send_response(&tx, &response);
                }
            });

            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    error!("Request task failed: {}", e);
                }
            }
        }

        info!(
            "EOF received, waiting for {} in-flight request(s)",
            in_flight.len()
        );
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Request task failed: {}", e);
            }
        }

        drop(tx);
        writer_task
            .await
            .context("Response writer task panicked")?
            .context("Failed to write response")?;

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one raw message line
    ///
    /// Returns `None` for notifications, which never get a response.
    pub async fn handle_message(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON: {}", e);
                return Some(McpResponse::err(
                    Value::Null,
                    McpError::parse_error(format!("Parse error: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: McpRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return Some(McpResponse::err(
                    id,
                    McpError::invalid_request(format!("Invalid request: {}", e)),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            warn!("Unsupported JSON-RPC version: {}", request.jsonrpc);
            return Some(McpResponse::err(
                id,
                McpError::invalid_request("Unsupported JSON-RPC version"),
            ));
        }

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        let response = match self.dispatch(request).await {
            Ok(result) => McpResponse::ok(id, result),
            Err(e) => {
                warn!("Request failed: {}", e);
                McpResponse::err(id, e)
            }
        };
        Some(response)
    }

    fn handle_notification(&self, request: &McpRequest) {
        match McpMethod::from(request.method.as_str()) {
            McpMethod::Initialized => info!("Client finished initialization"),
            _ => debug!("Ignoring notification: {}", request.method),
        }
    }

    /// Route a request to its handler
    async fn dispatch(&self, request: McpRequest) -> Result<Value, McpError> {
        match McpMethod::from(request.method.as_str()) {
            McpMethod::Initialize => Ok(self.handle_initialize()),
            McpMethod::Ping => Ok(json!({})),
            McpMethod::ToolsList => Ok(self.handle_tools_list()),
            McpMethod::ToolsCall => self.handle_tools_call(request.params).await,
            McpMethod::Initialized | McpMethod::Custom(_) => {
                Err(McpError::method_not_found(request.method))
            }
        }
    }

    /// Handle "initialize" method
    fn handle_initialize(&self) -> Value {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: json!({ "tools": {} }),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).unwrap_or_else(|_| json!({}))
    }

    /// Handle "tools/list" method
    fn handle_tools_list(&self) -> Value {
        debug!("Handling tools/list request");
        json!({ "tools": self.gateway.tools() })
    }

    /// Handle "tools/call" method
    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params = params.ok_or_else(|| McpError::invalid_params("Missing params"))?;
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| McpError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        info!("Handling tools/call request: {}", params.name);

        let result = self.gateway.call(&params.name, params.arguments).await;
        serde_json::to_value(result)
            .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e)))
    }
}

/// Queue a response for the writer task
fn send_response(tx: &mpsc::UnboundedSender<String>, response: &McpResponse) {
    let json = serde_json::to_string(response).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Failed to serialize response"},"id":null}"#.to_string()
    });
    if tx.send(json).is_err() {
        error!("Response writer has stopped; dropping response");
    }
}

/// Write each response as one line, flushing after every message
async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(json) = rx.recv().await {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        debug!("Sent: {}", json);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::tools::Whitelist;

    fn server() -> McpServer {
        let config = GatewayConfig::default().with_whitelist(Whitelist::parse("printf,echo"));
        McpServer::new(Gateway::new(config))
    }

    async fn call(line: &str) -> McpResponse {
        server()
            .handle_message(line)
            .await
            .expect("expected a response")
    }

    #[tokio::test]
    async fn test_initialize() {
        let resp = call(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;

        assert_eq!(resp.id, json!(1));
        let result = resp.into_result().unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let resp = call(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(resp.id, json!("p"));
        assert_eq!(resp.into_result().unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let resp = call(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let result = resp.into_result().unwrap();

        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "execute_command");
        assert!(tools[0]["inputSchema"]["properties"]["timeoutMs"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_executes() {
        let resp = call(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"execute_command","arguments":{"command":"printf","args":["ok"]}}}"#,
        )
        .await;
        let result = resp.into_result().unwrap();

        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["stdout"], "ok");
        assert_eq!(result["structuredContent"]["exitCode"], 0);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool_is_tool_error() {
        let resp = call(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"format_disk","arguments":{}}}"#,
        )
        .await;
        let result = resp.into_result().unwrap();

        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Unknown operation: format_disk");
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let resp = call(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#).await;
        assert_eq!(resp.into_result().unwrap_err().code, -32602);

        let resp = call(r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"arguments":{}}}"#).await;
        assert_eq!(resp.into_result().unwrap_err().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = call(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#).await;
        let err = resp.into_result().unwrap_err();

        assert_eq!(err.code, -32601);
        assert!(err.message.contains("resources/list"));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let resp = call("{not json").await;

        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.into_result().unwrap_err().code, -32700);
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let resp = call(r#"{"jsonrpc":"2.0","id":8}"#).await;
        assert_eq!(resp.id, json!(8));
        assert_eq!(resp.into_result().unwrap_err().code, -32600);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let resp = call(r#"{"jsonrpc":"1.0","id":9,"method":"ping"}"#).await;
        assert_eq!(resp.into_result().unwrap_err().code, -32600);
    }
}
