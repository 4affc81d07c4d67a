//! Execution Timeout
//!
//! Millisecond-granularity timeout attached to every execution request.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout when neither the request nor configuration sets one
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Deadlines that would overflow `Instant` are clamped to this far future
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Execution timeout
///
/// Measured from invocation start. When it elapses the child is killed
/// immediately, with no grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeout {
    duration: Duration,
}

impl Default for ExecutionTimeout {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TIMEOUT_MS)
    }
}

impl ExecutionTimeout {
    /// Create a new execution timeout
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use exec_gateway::tools::ExecutionTimeout;
    ///
    /// let timeout = ExecutionTimeout::new(Duration::from_secs(2));
    /// assert_eq!(timeout.as_millis(), 2000);
    /// ```
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Get the timeout duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Timeout in whole milliseconds (saturating)
    pub fn as_millis(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Instant at which an execution started at `start` must be killed
    pub fn deadline_from(&self, start: Instant) -> Instant {
        start
            .checked_add(self.duration)
            .unwrap_or_else(|| start + FAR_FUTURE)
    }
}

impl fmt::Display for ExecutionTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}
