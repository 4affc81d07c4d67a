// Gateway Configuration
//
// This module builds the immutable configuration the gateway runs with.
// Values come from defaults, then GATEWAY_* environment variables, then CLI
// flags (applied by main). Loading never fails: the merged result is validated
// once, after tracing is up, and injected into the gateway. Nothing reads the
// environment after startup.

use crate::tools::{ExecutionTimeout, Whitelist, DEFAULT_TIMEOUT_MS};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Comma-separated list of allowed command names
pub const ENV_ALLOWED_COMMANDS: &str = "GATEWAY_ALLOWED_COMMANDS";
/// Default timeout in milliseconds
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "GATEWAY_DEFAULT_TIMEOUT_MS";
/// Default working directory for executions
pub const ENV_WORKING_DIR: &str = "GATEWAY_WORKING_DIR";
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "GATEWAY_LOG_FORMAT";
pub const ENV_METRICS_ENABLED: &str = "GATEWAY_METRICS_ENABLED";
pub const ENV_METRICS_PORT: &str = "GATEWAY_METRICS_PORT";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Commands the gateway may execute
    pub whitelist: Arc<Whitelist>,

    /// Timeout applied when a request does not carry one
    pub default_timeout: ExecutionTimeout,

    /// Working directory applied when a request does not carry one
    /// (None: inherit the gateway's own working directory)
    pub default_working_dir: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Logging settings alone, so tracing can start before the rest is loaded
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().apply_overrides(lookup)
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.format = format;
        }
        self
    }

    /// Convert log level string to tracing::Level
    pub fn level(&self) -> Result<tracing::Level> {
        self.level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether to serve /metrics
    pub enabled: bool,

    /// Port for metrics server
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            whitelist: Arc::new(Whitelist::default()),
            default_timeout: ExecutionTimeout::from_millis(DEFAULT_TIMEOUT_MS),
            default_working_dir: None,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment
    ///
    /// The result is not validated; call [`GatewayConfig::validate`] once every
    /// override has been applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// `lookup` is queried with the `GATEWAY_*` variable names. Tests use this
    /// instead of mutating the real environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().apply_overrides(lookup)
    }

    /// Apply variable overrides to the configuration
    ///
    /// Unparseable numeric values are ignored and the previous value is kept.
    /// A blank whitelist variable counts as unset.
    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed = lookup(ENV_ALLOWED_COMMANDS).filter(|csv| !csv.trim().is_empty());
        self.whitelist = Arc::new(Whitelist::from_source(allowed.as_deref()));

        if let Some(timeout) = lookup(ENV_DEFAULT_TIMEOUT_MS) {
            match timeout.trim().parse::<u64>() {
                Ok(ms) => self.default_timeout = ExecutionTimeout::from_millis(ms),
                Err(_) => tracing::warn!(
                    "Ignoring invalid {}: {:?}",
                    ENV_DEFAULT_TIMEOUT_MS,
                    timeout
                ),
            }
        }

        if let Some(dir) = lookup(ENV_WORKING_DIR) {
            if !dir.trim().is_empty() {
                self.default_working_dir = Some(PathBuf::from(dir));
            }
        }

        self.logging = self.logging.apply_overrides(&lookup);

        // Metrics overrides
        if let Some(enabled) = lookup(ENV_METRICS_ENABLED) {
            self.metrics.enabled = enabled.parse().unwrap_or(self.metrics.enabled);
        }
        if let Some(port) = lookup(ENV_METRICS_PORT) {
            if let Ok(port) = port.parse::<u16>() {
                self.metrics.port = port;
            }
        }

        self
    }

    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = Arc::new(whitelist);
        self
    }

    pub fn with_default_timeout(mut self, timeout: ExecutionTimeout) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_default_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_working_dir = Some(dir.into());
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.default_timeout.as_millis() == 0 {
            anyhow::bail!("Default timeout must be > 0 ms");
        }

        if self.whitelist.is_empty() {
            tracing::warn!("Whitelist is empty: every execute_command call will be rejected");
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            anyhow::bail!("Metrics port must be > 0");
        }

        Ok(())
    }

}
