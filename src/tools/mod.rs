//! Command Execution Subsystem
//!
//! This module provides whitelisted subprocess execution for the gateway.
//! It enforces strict security measures to prevent shell injection attacks.
//!
//! # Security Features
//!
//! - **Command Whitelisting**: Only configured command names are allowed
//! - **List Invocation**: Commands are executed as argv lists, never through a shell
//! - **Timeout Enforcement**: Every execution is killed once its timeout elapses
//!
//! # Architecture
//!
//! The module is organized into:
//! - `whitelist.rs`: The set of permitted command names
//! - `executor.rs`: Subprocess execution, output capture and timeout handling
//! - `timeout.rs`: The per-request timeout value
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use exec_gateway::tools::{ExecutionRequest, ExecutionTimeout, ProcessExecutor, Whitelist};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = ProcessExecutor::new(Arc::new(Whitelist::default()));
//!
//!     let request = ExecutionRequest::new("git", vec!["status".to_string()])
//!         .with_timeout(ExecutionTimeout::from_millis(5_000));
//!
//!     let outcome = executor.execute(&request).await?;
//!     println!("Exit code: {}", outcome.exit_code);
//!     println!("Stdout: {}", outcome.stdout);
//!
//!     Ok(())
//! }
//! ```

mod executor;
mod timeout;
mod whitelist;

pub use executor::{
    CommandRunner, ExecutionError, ExecutionOutcome, ExecutionRequest, OsSpawner,
    ProcessExecutor, ProcessSpawner, EXIT_CODE_UNAVAILABLE,
};
pub use timeout::{ExecutionTimeout, DEFAULT_TIMEOUT_MS};
pub use whitelist::{Whitelist, DEFAULT_ALLOWED_COMMANDS};
