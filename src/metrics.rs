// Prometheus metrics for the execution gateway
//
// Exposed on the optional /metrics HTTP endpoint:
// - Executions by terminal outcome (counter)
// - Execution latency by terminal outcome (histogram)
// - Executions currently running (gauge)

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder};
use std::sync::{Arc, Once};
use std::time::Duration;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    pub static ref EXECUTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("gateway_executions_total", "Total number of execute_command calls by outcome"),
        &["outcome"]
    ).expect("Failed to create executions total metric");

    pub static ref EXECUTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new("gateway_execution_duration_seconds", "Wall-clock duration of executions in seconds"),
        &["outcome"]
    ).expect("Failed to create execution duration metric");

    pub static ref ACTIVE_EXECUTIONS: IntGauge = IntGauge::new(
        "gateway_active_executions",
        "Number of child processes currently supervised"
    ).expect("Failed to create active executions metric");
}

static INIT: Once = Once::new();

/// Terminal outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Rejected,
    SpawnFailed,
    TimedOut,
    DryRun,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::SpawnFailed => "spawn_failed",
            Self::TimedOut => "timed_out",
            Self::DryRun => "dry_run",
        }
    }
}

/// Register all collectors with the registry
///
/// Safe to call more than once; only the first call registers.
pub fn init() {
    INIT.call_once(|| {
        let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
            Box::new(EXECUTIONS_TOTAL.clone()),
            Box::new(EXECUTION_DURATION_SECONDS.clone()),
            Box::new(ACTIVE_EXECUTIONS.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::warn!("Failed to register metric: {}", e);
            }
        }
    });
}

/// Record one settled execution
pub fn record(outcome: Outcome, elapsed: Duration) {
    let label = outcome.as_str();
    EXECUTIONS_TOTAL.with_label_values(&[label]).inc();
    EXECUTION_DURATION_SECONDS
        .with_label_values(&[label])
        .observe(elapsed.as_secs_f64());
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(gather_metrics().is_ok());
    }

    #[test]
    fn test_record_increments_counter() {
        init();
        let before = EXECUTIONS_TOTAL.with_label_values(&["rejected"]).get();

        record(Outcome::Rejected, Duration::from_millis(1));

        let after = EXECUTIONS_TOTAL.with_label_values(&["rejected"]).get();
        assert!(after > before);

        let text = gather_metrics().unwrap();
        assert!(text.contains("gateway_executions_total"));
        assert!(text.contains("outcome=\"rejected\""));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Completed.as_str(), "completed");
        assert_eq!(Outcome::Rejected.as_str(), "rejected");
        assert_eq!(Outcome::SpawnFailed.as_str(), "spawn_failed");
        assert_eq!(Outcome::TimedOut.as_str(), "timed_out");
        assert_eq!(Outcome::DryRun.as_str(), "dry_run");
    }
}
