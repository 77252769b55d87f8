//! Error types for warpqueue.

use thiserror::Error;

/// Result type for warpqueue operations.
pub type Result<T> = std::result::Result<T, WorkQueueError>;

/// Errors that can occur while building or driving a work queue.
///
/// Configuration and resource errors are raised at queue construction,
/// never mid-run. Per-unit processing failures are not represented here:
/// they belong in the work unit's own output type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkQueueError {
    /// Invalid configuration (zero or oversized group, empty grid, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Per-lane and per-unit device state does not fit the memory budget.
    #[error("Resource exhausted: {requested} bytes requested, {available} bytes available")]
    ResourceExhausted {
        /// Bytes the queue would need.
        requested: usize,
        /// Bytes the device budget allows.
        available: usize,
    },

    /// Condition waits kept returning early and the driver ran out of retries.
    #[error(
        "Starvation timeout: condition quota {quota} not reached ({reached} signaled) after {retries} retries"
    )]
    StarvationTimeout {
        /// Quota the groups were waiting for.
        quota: u64,
        /// Signals observed when the last wait gave up.
        reached: u64,
        /// Launch retries spent by the driver.
        retries: u32,
    },

    /// The driver hit its launch limit with work still remaining.
    #[error("Launch budget exceeded after {launches} launches with work remaining")]
    LaunchBudgetExceeded {
        /// Launches performed.
        launches: u64,
    },

    /// Some unit indices never produced a result.
    #[error("Incomplete run: {missing} work units produced no result")]
    IncompleteRun {
        /// Number of unit indices without a result.
        missing: usize,
    },

    /// A simulated execution group panicked or could not be started.
    #[error("Kernel fault: {0}")]
    KernelFault(String),
}

impl WorkQueueError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a kernel fault error.
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::KernelFault(msg.into())
    }

    /// Create a kernel fault from a panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::KernelFault(msg)
    }

    /// Whether relaunching the same queue could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StarvationTimeout { .. })
    }
}
