// exec-gateway - Main Entry Point
//
// Command-line front end for the execution gateway:
// - serve: MCP server over stdin/stdout (default)
// - exec: one-shot execution through the same gateway
// - whitelist: print the effective allowed commands
//
// stdout belongs to the protocol; all logging goes to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exec_gateway::config::{GatewayConfig, LoggingConfig};
use exec_gateway::gateway::{Gateway, EXECUTE_COMMAND};
use exec_gateway::mcp::McpServer;
use exec_gateway::metrics;
use exec_gateway::metrics_server::start_metrics_server;
use exec_gateway::tools::{ExecutionTimeout, Whitelist};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// exec-gateway: whitelisted command execution for AI agents
#[derive(Parser, Debug)]
#[command(name = "exec-gateway")]
#[command(author = "exec-gateway Contributors")]
#[command(version)]
#[command(about = "Whitelisted, shell-less command execution gateway for AI agents", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Comma-separated allowed commands (overrides GATEWAY_ALLOWED_COMMANDS)
    #[arg(long, global = true)]
    allowed_commands: Option<String>,

    /// Default timeout in milliseconds (overrides GATEWAY_DEFAULT_TIMEOUT_MS)
    #[arg(long, global = true)]
    default_timeout_ms: Option<u64>,

    /// Default working directory (overrides GATEWAY_WORKING_DIR)
    #[arg(long, global = true)]
    working_dir: Option<PathBuf>,

    /// Log format: compact, pretty or json (overrides GATEWAY_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Serve Prometheus metrics on this localhost port
    #[arg(long, global = true)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdin/stdout (default)
    Serve,
    /// Execute one command through the gateway and print the JSON result
    Exec {
        /// Timeout in milliseconds for this execution
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Working directory for this execution
        #[arg(long)]
        cwd: Option<String>,

        /// Echo the resolved request without running it
        #[arg(long)]
        dry_run: bool,

        /// Command name (must be whitelisted)
        command: String,

        /// Arguments, passed verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print the effective allowed commands
    Whitelist,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Tracing first, so warnings raised while loading the configuration are seen
    init_tracing(&logging_config(&args));
    let config = load_config(&args)?;

    info!(
        "exec-gateway v{} starting ({} allowed commands, default timeout {})",
        env!("CARGO_PKG_VERSION"),
        config.whitelist.len(),
        config.default_timeout
    );

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exec {
            timeout_ms,
            cwd,
            dry_run,
            command,
            args,
        } => {
            let gateway = Gateway::new(config);
            let arguments = json!({
                "command": command,
                "args": args,
                "cwd": cwd,
                "timeoutMs": timeout_ms,
                "dryRun": dry_run,
            });

            let result = gateway.call(EXECUTE_COMMAND, arguments).await;
            println!("{}", result.text_content());

            Ok(if result.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Whitelist => {
            for command in config.whitelist.commands() {
                println!("{}", command);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logging settings: defaults, then environment, then CLI flags
fn logging_config(args: &Args) -> LoggingConfig {
    let mut logging = LoggingConfig::from_lookup(|key| std::env::var(key).ok());
    apply_logging_flags(args, &mut logging);
    logging
}

fn apply_logging_flags(args: &Args, logging: &mut LoggingConfig) {
    if let Some(ref format) = args.log_format {
        logging.format = format.clone();
    }
    if args.verbose {
        logging.level = "debug".to_string();
    }
}

/// Build the configuration: defaults, then environment, then CLI flags
///
/// Validation runs once, on the merged result, so a flag can replace an
/// invalid environment value.
fn load_config(args: &Args) -> Result<GatewayConfig> {
    let mut config = GatewayConfig::from_env();

    if let Some(ref allowed) = args.allowed_commands {
        config = config.with_whitelist(Whitelist::parse(allowed));
    }
    if let Some(ms) = args.default_timeout_ms {
        config = config.with_default_timeout(ExecutionTimeout::from_millis(ms));
    }
    if let Some(ref dir) = args.working_dir {
        config = config.with_default_working_dir(dir);
    }
    if let Some(port) = args.metrics_port {
        config.metrics.enabled = true;
        config.metrics.port = port;
    }
    apply_logging_flags(args, &mut config.logging);

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Initialize tracing on stderr
///
/// Unknown levels and formats fall back to `info` and `compact` here;
/// `GatewayConfig::validate` reports them right after.
fn init_tracing(logging: &LoggingConfig) {
    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.to_lowercase().as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }
}

/// Run the MCP server until stdin closes
async fn serve(config: GatewayConfig) -> Result<()> {
    metrics::init();

    if config.metrics.enabled {
        let port = config.metrics.port;
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(port).await {
                error!("Metrics server stopped: {:#}", e);
            }
        });
    }

    McpServer::new(Gateway::new(config))
        .serve_stdio()
        .await
        .context("MCP server failed")
}
