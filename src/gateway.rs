//! Execution Gateway
//!
//! The request boundary in front of the process executor. It turns untyped
//! `execute_command` arguments into a validated [`ExecutionRequest`], resolves
//! defaults from the injected [`GatewayConfig`], and shapes every result into
//! a structured [`ToolCallResult`]. Nothing that happens to a child process
//! escapes as anything other than a tagged response.

use crate::config::GatewayConfig;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::metrics::{self, Outcome};
use crate::tools::{
    CommandRunner, ExecutionError, ExecutionOutcome, ExecutionRequest, ExecutionTimeout,
    ProcessExecutor,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the single operation the gateway exposes
pub const EXECUTE_COMMAND: &str = "execute_command";

/// Malformed `execute_command` arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Arguments must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field 'command' must not be empty")]
    EmptyCommand,

    #[error("Field 'timeoutMs' must be greater than 0")]
    ZeroTimeout,

    #[error("Invalid arguments: {0}")]
    Invalid(String),
}

/// Raw `execute_command` arguments as sent by the caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecuteCommandParams {
    pub command: String,

    #[serde(default)]
    pub args: Option<Vec<String>>,

    #[serde(default)]
    pub cwd: Option<String>,

    /// Any non-negative JSON number; fractions round up to whole milliseconds
    #[serde(default, rename = "timeoutMs", deserialize_with = "deserialize_timeout_ms")]
    pub timeout_ms: Option<u64>,

    #[serde(default, rename = "dryRun")]
    pub dry_run: Option<bool>,
}

fn deserialize_timeout_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(ms.ceil() as u64)),
        Some(ms) => Err(serde::de::Error::custom(format!(
            "timeoutMs must be a non-negative number, got {}",
            ms
        ))),
    }
}

impl ExecuteCommandParams {
    /// Validate the untyped argument object
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] naming the offending field.
    pub fn from_value(arguments: Value) -> Result<Self, RequestError> {
        let object = arguments.as_object().ok_or(RequestError::NotAnObject)?;

        if object.get("command").map_or(true, Value::is_null) {
            return Err(RequestError::MissingField("command"));
        }

        let params: Self =
            serde_json::from_value(arguments).map_err(|e| RequestError::Invalid(e.to_string()))?;

        if params.command.trim().is_empty() {
            return Err(RequestError::EmptyCommand);
        }
        if params.timeout_ms == Some(0) {
            return Err(RequestError::ZeroTimeout);
        }

        Ok(params)
    }

    /// Resolve optional fields against configured defaults
    pub fn resolve(self, config: &GatewayConfig) -> (ExecutionRequest, bool) {
        let timeout = self
            .timeout_ms
            .map(ExecutionTimeout::from_millis)
            .unwrap_or(config.default_timeout);

        let working_dir = self
            .cwd
            .map(PathBuf::from)
            .or_else(|| config.default_working_dir.clone());

        let request = ExecutionRequest {
            command: self.command,
            args: self.args.unwrap_or_default(),
            working_dir,
            timeout,
        };

        (request, self.dry_run.unwrap_or(false))
    }
}

/// The command-execution gateway
///
/// Owns the immutable configuration and the runner that actually executes
/// requests. Cheap to share behind an `Arc`; concurrent calls share nothing
/// mutable.
#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway backed by a [`ProcessExecutor`] over the configured whitelist
    pub fn new(config: GatewayConfig) -> Self {
        let executor = ProcessExecutor::new(config.whitelist.clone());
        Self::with_runner(config, Arc::new(executor))
    }

    /// Create a gateway with a custom runner
    pub fn with_runner(config: GatewayConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    /// Tools advertised by `tools/list`
    pub fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: EXECUTE_COMMAND.to_string(),
            description: format!(
                "Execute a whitelisted command directly (no shell). Arguments are passed \
                 verbatim. Allowed commands: {}. Default timeout: {}.",
                self.config.whitelist.commands().join(", "),
                self.config.default_timeout
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Command name; must be in the whitelist"
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Arguments, passed positionally without shell parsing"
                    },
                    "cwd": {
                        "type": "string",
                        "description": "Working directory (defaults to the gateway's)"
                    },
                    "timeoutMs": {
                        "type": "number",
                        "exclusiveMinimum": 0,
                        "description": "Kill the process after this many milliseconds (fractions round up)"
                    },
                    "dryRun": {
                        "type": "boolean",
                        "description": "Echo the resolved request without running it"
                    }
                },
                "required": ["command"]
            }),
        }]
    }

    /// Dispatch a named operation
    ///
    /// Unknown names are answered with an error-tagged text result and never
    /// reach the whitelist or the runner.
    pub async fn call(&self, operation: &str, arguments: Value) -> ToolCallResult {
        match operation {
            EXECUTE_COMMAND => self.execute_command(arguments).await,
            other => {
                warn!("Unknown operation requested: {}", other);
                ToolCallResult::text(format!("Unknown operation: {}", other), true)
            }
        }
    }

    /// Handle one `execute_command` call
    pub async fn execute_command(&self, arguments: Value) -> ToolCallResult {
        let params = match ExecuteCommandParams::from_value(arguments) {
            Ok(params) => params,
            Err(e) => {
                warn!("Rejected malformed execute_command arguments: {}", e);
                return ToolCallResult::json(json!({ "ok": false, "error": e.to_string() }), true);
            }
        };

        let (request, dry_run) = params.resolve(&self.config);

        if dry_run {
            return self.dry_run(&request);
        }

        match self.runner.run(&request).await {
            Ok(outcome) => ToolCallResult::json(success_payload(&request, &outcome), false),
            Err(e) => ToolCallResult::json(failure_payload(&request, &e), true),
        }
    }

    /// Echo the resolved request without spawning anything
    fn dry_run(&self, request: &ExecutionRequest) -> ToolCallResult {
        let cwd = match &request.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        let allowed = self.config.whitelist.is_allowed(&request.command);

        info!(command = %request.command, allowed, "Dry run");
        debug!("Dry run arguments: {:?}", request.args);
        metrics::record(Outcome::DryRun, Duration::ZERO);

        ToolCallResult::json(
            json!({
                "ok": true,
                "dryRun": true,
                "command": request.command,
                "args": request.args,
                "cwd": cwd.display().to_string(),
                "timeoutMs": request.timeout.as_millis(),
                "allowed": allowed,
            }),
            false,
        )
    }
}

fn success_payload(request: &ExecutionRequest, outcome: &ExecutionOutcome) -> Value {
    let mut payload = json!({
        "ok": true,
        "command": request.command,
        "args": request.args,
        "exitCode": outcome.exit_code,
        "stdout": outcome.stdout,
        "stderr": outcome.stderr,
        "durationMs": outcome.duration_ms,
    });
    if let Some(signal) = outcome.signal {
        payload["signal"] = json!(signal);
    }
    payload
}

fn failure_payload(request: &ExecutionRequest, error: &ExecutionError) -> Value {
    json!({
        "ok": false,
        "command": request.command,
        "args": request.args,
        "error": error.to_string(),
        "errorKind": error.kind(),
    })
}
