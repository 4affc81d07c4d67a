//! Process Executor
//!
//! This module runs whitelisted commands as child processes.
//! It implements the whitelist gate, shell-less spawning, output capture and
//! timeout enforcement, and resolves every call to exactly one outcome.

use super::timeout::ExecutionTimeout;
use super::whitelist::Whitelist;
use crate::metrics::{self, Outcome, ACTIVE_EXECUTIONS};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Exit code reported when the process ended without one (killed by a signal)
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// Size of a single pipe read
const READ_CHUNK_SIZE: usize = 8192;

/// A request to run one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Command name, matched verbatim against the whitelist
    pub command: String,

    /// Arguments, passed positionally and never interpreted
    pub args: Vec<String>,

    /// Working directory (None: the gateway's current directory at spawn time)
    pub working_dir: Option<PathBuf>,

    /// Kill the process if it is still running after this long
    pub timeout: ExecutionTimeout,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
            timeout: ExecutionTimeout::default(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: ExecutionTimeout) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a process that ran to completion
///
/// A non-zero exit code is still a completed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    /// Exit code, or [`EXIT_CODE_UNAVAILABLE`] if none was observed
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Terminating signal, when the process was killed by one (Unix only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,

    /// Wall-clock duration from invocation start
    pub duration_ms: u64,
}

impl ExecutionOutcome {
    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self.signal {
            Some(signal) => format!(
                "Killed by signal {} ({}ms, {} bytes output)",
                signal,
                self.duration_ms,
                self.stdout.len() + self.stderr.len()
            ),
            None => format!(
                "Exited with code {} ({}ms, {} bytes output)",
                self.exit_code,
                self.duration_ms,
                self.stdout.len() + self.stderr.len()
            ),
        }
    }
}

/// Why an execution failed to produce an outcome
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Command '{command}' is not in the allowed whitelist")]
    CommandNotAllowed { command: String },

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },
}

impl ExecutionError {
    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommandNotAllowed { .. } => "command_not_allowed",
            Self::Timeout { .. } => "timeout",
            Self::Spawn { .. } => "spawn_error",
        }
    }

    fn metrics_outcome(&self) -> Outcome {
        match self {
            Self::CommandNotAllowed { .. } => Outcome::Rejected,
            Self::Timeout { .. } => Outcome::TimedOut,
            Self::Spawn { .. } => Outcome::SpawnFailed,
        }
    }
}

/// Creates OS processes
///
/// The seam exists so tests can observe every process creation attempt.
pub trait ProcessSpawner: Send + Sync + fmt::Debug {
    fn spawn(&self, command: &mut Command) -> io::Result<Child>;
}

/// Spawns through `tokio::process::Command::spawn`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

impl ProcessSpawner for OsSpawner {
    fn spawn(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

/// Anything that can run an [`ExecutionRequest`]
///
/// The gateway depends on this trait rather than on [`ProcessExecutor`]
/// directly, so request handling can be tested with a spy.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError>;
}

/// Executor for whitelisted, shell-less subprocesses
///
/// # Security
///
/// 1. The whitelist is checked before a `Command` is even built
/// 2. `tokio::process::Command` receives the program and argv directly, no shell
/// 3. The timeout kills the child with SIGKILL; `kill_on_drop` covers every other exit path
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use exec_gateway::tools::{ExecutionRequest, ProcessExecutor, Whitelist};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let executor = ProcessExecutor::new(Arc::new(Whitelist::parse("echo")));
///     let request = ExecutionRequest::new("echo", vec!["hello".to_string()]);
///
///     let outcome = executor.execute(&request).await?;
///     assert_eq!(outcome.stdout, "hello\n");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    whitelist: Arc<Whitelist>,
    spawner: Arc<dyn ProcessSpawner>,
}

impl ProcessExecutor {
    pub fn new(whitelist: Arc<Whitelist>) -> Self {
        Self {
            whitelist,
            spawner: Arc::new(OsSpawner),
        }
    }

    /// Replace the process spawner
    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Execute a request and return its single terminal result
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::CommandNotAllowed`] if the command is not whitelisted
    ///   (no process is created)
    /// - [`ExecutionError::Spawn`] if the OS refuses to start the process
    /// - [`ExecutionError::Timeout`] if the process outlives `request.timeout`
    ///   (the process is killed and reaped before this returns)
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let start = Instant::now();
        let span = info_span!(
            "execute",
            execution_id = %Uuid::new_v4(),
            command = %request.command,
        );

        let result = self.execute_inner(request, start).instrument(span).await;

        let outcome = match &result {
            Ok(_) => Outcome::Completed,
            Err(e) => e.metrics_outcome(),
        };
        metrics::record(outcome, start.elapsed());

        result
    }

    async fn execute_inner(
        &self,
        request: &ExecutionRequest,
        start: Instant,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        if !self.whitelist.is_allowed(&request.command) {
            warn!("Command rejected by whitelist");
            return Err(ExecutionError::CommandNotAllowed {
                command: request.command.clone(),
            });
        }

        info!(args = request.args.len(), timeout = %request.timeout, "Executing");
        debug!("Arguments: {:?}", request.args);

        let deadline = request.timeout.deadline_from(start);

        let mut process = Command::new(&request.command);
        process
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = request.working_dir {
            process.current_dir(dir);
        }

        let child = self.spawner.spawn(&mut process).map_err(|e| {
            warn!("Failed to spawn process: {}", e);
            ExecutionError::Spawn {
                command: request.command.clone(),
                message: e.to_string(),
            }
        })?;
        debug!(pid = ?child.id(), "Process spawned");

        let _active = ActiveExecution::enter();
        let (status, stdout, stderr) =
            supervise(child, &request.command, deadline, request.timeout).await?;

        let outcome = ExecutionOutcome {
            exit_code: status.code().unwrap_or(EXIT_CODE_UNAVAILABLE),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            signal: exit_signal(&status),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if status.success() {
            info!("Command succeeded: {}", outcome.summary());
        } else {
            warn!("Command finished unsuccessfully: {}", outcome.summary());
        }

        Ok(outcome)
    }
}

#[async_trait]
impl CommandRunner for ProcessExecutor {
    async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError> {
        self.execute(request).await
    }
}

/// Drive a spawned child until exactly one terminal event settles it
///
/// Pipe reads, process exit and the deadline all race in one `select!`.
/// The call completes normally once the process has exited and both pipes
/// reached EOF. If the deadline passes first, a running process is killed and
/// the call times out; an exited one completes with the output read so far.
async fn supervise(
    mut child: Child,
    command: &str,
    deadline: Instant,
    timeout: ExecutionTimeout,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ExecutionError> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_chunk = [0u8; READ_CHUNK_SIZE];
    let mut stderr_chunk = [0u8; READ_CHUNK_SIZE];
    let mut exited: Option<ExitStatus> = None;

    let timer = tokio::time::sleep_until(deadline);
    tokio::pin!(timer);

    loop {
        if let Some(status) = exited {
            if stdout.is_none() && stderr.is_none() {
                return Ok((status, stdout_buf, stderr_buf));
            }
        }

        tokio::select! {
            read = read_chunk(&mut stdout, &mut stdout_chunk), if stdout.is_some() => {
                absorb(read, &mut stdout, &stdout_chunk, &mut stdout_buf, "stdout");
            }
            read = read_chunk(&mut stderr, &mut stderr_chunk), if stderr.is_some() => {
                absorb(read, &mut stderr, &stderr_chunk, &mut stderr_buf, "stderr");
            }
            waited = child.wait(), if exited.is_none() => {
                match waited {
                    Ok(status) => {
                        debug!(?status, "Process exited");
                        exited = Some(status);
                    }
                    Err(e) => {
                        error!("Failed to wait for process: {}", e);
                        return Err(ExecutionError::Spawn {
                            command: command.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            () = &mut timer => {
                // The child exited on its own; a descendant is holding its pipes open
                if let Some(status) = exited {
                    warn!("Output pipes still open at the deadline; returning output read so far");
                    return Ok((status, stdout_buf, stderr_buf));
                }

                warn!("Command timed out after {}", timeout);
                if let Err(e) = child.kill().await {
                    error!("Failed to kill timed out process: {}", e);
                }
                return Err(ExecutionError::Timeout {
                    timeout_ms: timeout.as_millis(),
                });
            }
        }
    }
}

async fn read_chunk<R>(pipe: &mut Option<R>, chunk: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(pipe) => pipe.read(chunk).await,
        None => Ok(0),
    }
}

/// Append a read to its buffer, closing the pipe on EOF or error
fn absorb<R>(
    read: io::Result<usize>,
    pipe: &mut Option<R>,
    chunk: &[u8],
    buffer: &mut Vec<u8>,
    stream: &str,
) {
    match read {
        Ok(0) => *pipe = None,
        Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        Err(e) => {
            warn!("Failed to read {}: {}", stream, e);
            *pipe = None;
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Holds the active-executions gauge up for the lifetime of a child
struct ActiveExecution;

impl ActiveExecution {
    fn enter() -> Self {
        ACTIVE_EXECUTIONS.inc();
        Self
    }
}

impl Drop for ActiveExecution {
    fn drop(&mut self) {
        ACTIVE_EXECUTIONS.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Spawner that records every attempt and the pids it produced
    #[derive(Debug, Default)]
    struct RecordingSpawner {
        attempts: AtomicUsize,
        pids: Mutex<Vec<u32>>,
    }

    impl ProcessSpawner for RecordingSpawner {
        fn spawn(&self, command: &mut Command) -> io::Result<Child> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let child = command.spawn()?;
            if let Some(pid) = child.id() {
                self.pids.lock().unwrap().push(pid);
            }
            Ok(child)
        }
    }

    fn test_whitelist() -> Arc<Whitelist> {
        Arc::new(Whitelist::parse(
            "echo,printf,sh,sleep,pwd,cat,true,false,this-command-does-not-exist-12345",
        ))
    }

    fn executor() -> ProcessExecutor {
        ProcessExecutor::new(test_whitelist())
    }

    fn recording_executor() -> (ProcessExecutor, Arc<RecordingSpawner>) {
        let spawner = Arc::new(RecordingSpawner::default());
        let executor = ProcessExecutor::new(test_whitelist()).with_spawner(spawner.clone());
        (executor, spawner)
    }

    fn request(command: &str, args: &[&str]) -> ExecutionRequest {
        ExecutionRequest::new(command, args.iter().map(|s| s.to_string()).collect())
    }

    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        std::path::Path::new(&format!("/proc/{}", pid)).exists()
    }

    #[tokio::test]
    async fn test_execute_printf_exact_output() {
        let outcome = executor().execute(&request("printf", &["ok"])).await.unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "ok");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.signal, None);
    }

    #[tokio::test]
    async fn test_exit_code_matches_child() {
        for code in [0, 1, 3, 42] {
            let script = format!("exit {}", code);
            let outcome = executor()
                .execute(&request("sh", &["-c", script.as_str()]))
                .await
                .unwrap();
            assert_eq!(outcome.exit_code, code);
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_outcome() {
        let outcome = executor().execute(&request("false", &[])).await.unwrap();
        assert_eq!(outcome.exit_code, 1);
    }

    #[tokio::test]
    async fn test_stderr_is_captured_separately() {
        let outcome = executor()
            .execute(&request("sh", &["-c", "printf out; printf err >&2"]))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "out");
        assert_eq!(outcome.stderr, "err");
    }

    #[tokio::test]
    async fn test_empty_output_is_empty_string() {
        let outcome = executor().execute(&request("true", &[])).await.unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_large_output_is_complete_and_ordered() {
        let outcome = executor()
            .execute(&request(
                "sh",
                &["-c", "i=0; while [ $i -lt 5000 ]; do echo line$i; i=$((i+1)); done"],
            ))
            .await
            .unwrap();

        let lines: Vec<&str> = outcome.stdout.lines().collect();
        assert_eq!(lines.len(), 5000);
        assert_eq!(lines[0], "line0");
        assert_eq!(lines[4999], "line4999");
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(*line, format!("line{}", i));
        }
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let outcome = executor()
            .execute(&request("echo", &["a; rm -rf /tmp/nope", "$(whoami)", "`id`", "|", "&&"]))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "a; rm -rf /tmp/nope $(whoami) `id` | &&\n");
    }

    #[tokio::test]
    async fn test_not_allowed_never_spawns() {
        let (executor, spawner) = recording_executor();

        for command in ["bash", "rm", "/bin/echo", "echo ", "echo; ls", ""] {
            let err = executor.execute(&request(command, &[])).await.unwrap_err();
            assert!(matches!(err, ExecutionError::CommandNotAllowed { .. }));
            assert_eq!(err.kind(), "command_not_allowed");
        }

        assert_eq!(spawner.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allowed_command_spawns_once() {
        let (executor, spawner) = recording_executor();

        executor.execute(&request("true", &[])).await.unwrap();

        assert_eq!(spawner.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nonexistent_command_is_spawn_error() {
        let err = executor()
            .execute(&request("this-command-does-not-exist-12345", &[]))
            .await
            .unwrap_err();

        match err {
            ExecutionError::Spawn { command, message } => {
                assert_eq!(command, "this-command-does-not-exist-12345");
                assert!(!message.is_empty());
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_working_directory_is_spawn_error() {
        let err = executor()
            .execute(&request("pwd", &[]).with_working_dir("/definitely/not/a/dir"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().canonicalize().unwrap();

        let outcome = executor()
            .execute(&request("pwd", &["-P"]).with_working_dir(dir.path()))
            .await
            .unwrap();

        assert_eq!(outcome.stdout.trim_end(), expected.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_default_working_directory_is_current_dir() {
        let expected = std::env::current_dir().unwrap().canonicalize().unwrap();

        let outcome = executor().execute(&request("pwd", &["-P"])).await.unwrap();

        assert_eq!(outcome.stdout.trim_end(), expected.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let (executor, spawner) = recording_executor();
        let started = std::time::Instant::now();

        let err = executor
            .execute(&request("sleep", &["2"]).with_timeout(ExecutionTimeout::from_millis(200)))
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert_eq!(err, ExecutionError::Timeout { timeout_ms: 200 });
        assert!(err.to_string().contains("200ms"));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);

        #[cfg(target_os = "linux")]
        {
            let pids = spawner.pids.lock().unwrap().clone();
            assert_eq!(pids.len(), 1);
            assert!(!is_running(pids[0]), "timed out process is still running");
        }
        #[cfg(not(target_os = "linux"))]
        let _ = spawner;
    }

    #[tokio::test]
    async fn test_exited_child_with_descendant_holding_pipes_completes() {
        // The shell exits at once, but the backgrounded sleep keeps stdout open
        let started = std::time::Instant::now();

        let outcome = executor()
            .execute(
                &request("sh", &["-c", "echo hi; sleep 2 & exit 0"])
                    .with_timeout(ExecutionTimeout::from_millis(300)),
            )
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.signal, None);
        assert_eq!(outcome.stdout, "hi\n");
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fast_command_beats_timeout() {
        let outcome = executor()
            .execute(&request("printf", &["fast"]).with_timeout(ExecutionTimeout::from_millis(5000)))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "fast");
        assert!(outcome.duration_ms < 5000);
    }

    #[tokio::test]
    async fn test_near_deadline_race_settles_once() {
        // Exit and timer fire close together; each call must settle exactly once
        let (executor, spawner) = recording_executor();
        let executor = Arc::new(executor);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let executor = executor.clone();
                tokio::spawn(async move {
                    executor
                        .execute(
                            &request("sleep", &["0.1"])
                                .with_timeout(ExecutionTimeout::from_millis(100)),
                        )
                        .await
                })
            })
            .collect();

        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => assert_eq!(outcome.exit_code, 0),
                Err(ExecutionError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 100),
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(spawner.attempts.load(Ordering::SeqCst), 16);
        #[cfg(target_os = "linux")]
        for pid in spawner.pids.lock().unwrap().iter() {
            assert!(!is_running(*pid));
        }
    }

    #[tokio::test]
    async fn test_concurrent_executions_are_independent() {
        let executor = Arc::new(executor());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let executor = executor.clone();
                tokio::spawn(async move {
                    let out = format!("run-{}", i);
                    let outcome = executor.execute(&request("printf", &[out.as_str()])).await.unwrap();
                    (out, outcome.stdout)
                })
            })
            .collect();

        for handle in handles {
            let (expected, stdout) = handle.await.unwrap();
            assert_eq!(stdout, expected);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_externally_signalled_process_reports_sentinel() {
        let outcome = executor()
            .execute(&request("sh", &["-c", "kill -9 $$"]))
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, EXIT_CODE_UNAVAILABLE);
        assert_eq!(outcome.signal, Some(9));
        assert!(outcome.summary().contains("signal 9"));
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        // cat would block forever on an inherited terminal
        let outcome = executor()
            .execute(&request("cat", &[]).with_timeout(ExecutionTimeout::from_millis(2000)))
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "");
    }

    #[test]
    fn test_error_messages() {
        let err = ExecutionError::CommandNotAllowed {
            command: "rm".to_string(),
        };
        assert!(err.to_string().contains("not in the allowed whitelist"));

        let err = ExecutionError::Timeout { timeout_ms: 1500 };
        assert_eq!(err.to_string(), "Command timed out after 1500ms");
        assert_eq!(err.kind(), "timeout");

        let err = ExecutionError::Spawn {
            command: "x".to_string(),
            message: "No such file or directory (os error 2)".to_string(),
        };
        assert!(err.to_string().contains("No such file or directory"));
        assert_eq!(err.kind(), "spawn_error");
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let outcome = ExecutionOutcome {
            exit_code: 0,
            stdout: "ok".to_string(),
            stderr: String::new(),
            signal: None,
            duration_ms: 3,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["exitCode"], 0);
        assert_eq!(json["stdout"], "ok");
        assert_eq!(json["stderr"], "");
        assert_eq!(json["durationMs"], 3);
        assert!(json.get("signal").is_none());
    }
}
