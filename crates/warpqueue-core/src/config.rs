//! Work queue configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkQueueError};
use crate::types::WARP_SIZE;

/// How idle lanes acquire new work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStrategy {
    /// Strict input order; each idle lane pulls the next index from the
    /// shared cursor. Host relaunches per window.
    Ordered,
    /// Lockstep batches with compaction between passes. Host relaunches per
    /// pass.
    MultiPass,
    /// Resident groups that refill idle lanes with one claim per refill.
    #[default]
    PersistentWarps,
    /// Resident lanes that each claim work independently.
    PersistentThreads,
}

impl QueueStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [QueueStrategy; 4] = [
        QueueStrategy::Ordered,
        QueueStrategy::MultiPass,
        QueueStrategy::PersistentWarps,
        QueueStrategy::PersistentThreads,
    ];

    /// Whether a single launch drains the whole source.
    pub fn resolves_on_device(self) -> bool {
        matches!(
            self,
            QueueStrategy::PersistentWarps | QueueStrategy::PersistentThreads
        )
    }

    /// Stable name used in logs and configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            QueueStrategy::Ordered => "ordered",
            QueueStrategy::MultiPass => "multi-pass",
            QueueStrategy::PersistentWarps => "persistent-warps",
            QueueStrategy::PersistentThreads => "persistent-threads",
        }
    }
}

impl fmt::Display for QueueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStrategy {
    type Err = WorkQueueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "ordered" => Ok(QueueStrategy::Ordered),
            "multi-pass" | "multipass" => Ok(QueueStrategy::MultiPass),
            "persistent-warps" => Ok(QueueStrategy::PersistentWarps),
            "persistent-threads" => Ok(QueueStrategy::PersistentThreads),
            other => Err(WorkQueueError::config(format!(
                "unknown queue strategy '{}'",
                other
            ))),
        }
    }
}

/// Hardware limits of the executing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLimits {
    /// Largest supported execution group.
    pub max_group_size: usize,
    /// Device memory available for per-lane and per-unit queue state.
    pub memory_bytes: usize,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_group_size: 1024,
            memory_bytes: 1 << 30,
        }
    }
}

/// Configuration for a work queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkQueueConfig {
    /// Lanes per execution group.
    pub group_size: usize,
    /// Queueing strategy.
    pub strategy: QueueStrategy,
    /// Polling budget for a bounded condition wait.
    pub max_condition_iterations: u64,
    /// Resident execution groups (grid width).
    pub num_groups: usize,
    /// Units admitted per host-driven launch.
    pub launch_capacity: usize,
    /// Lockstep iterations per multi-pass pass.
    pub pass_steps: u32,
    /// Launches without progress the driver tolerates when groups starve.
    pub starvation_retries: u32,
    /// Abort the run after this many launches.
    pub max_launches: Option<u64>,
    /// Device limits.
    pub limits: DeviceLimits,
}

fn default_num_groups() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for WorkQueueConfig {
    fn default() -> Self {
        Self {
            group_size: WARP_SIZE,
            strategy: QueueStrategy::default(),
            max_condition_iterations: 1 << 16,
            num_groups: default_num_groups(),
            launch_capacity: 4096,
            pass_steps: 64,
            starvation_retries: 3,
            max_launches: None,
            limits: DeviceLimits::default(),
        }
    }
}

impl WorkQueueConfig {
    /// Default configuration with the given strategy.
    #[must_use]
    pub fn with_strategy(strategy: QueueStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Ordered queue preset.
    #[must_use]
    pub fn ordered() -> Self {
        Self::with_strategy(QueueStrategy::Ordered)
    }

    /// Multi-pass queue preset.
    #[must_use]
    pub fn multi_pass() -> Self {
        Self::with_strategy(QueueStrategy::MultiPass)
    }

    /// Persistent-warps queue preset.
    #[must_use]
    pub fn persistent_warps() -> Self {
        Self::with_strategy(QueueStrategy::PersistentWarps)
    }

    /// Persistent-threads queue preset.
    #[must_use]
    pub fn persistent_threads() -> Self {
        Self::with_strategy(QueueStrategy::PersistentThreads)
    }

    /// Total lanes across the grid.
    pub fn total_lanes(&self) -> usize {
        self.group_size * self.num_groups
    }

    /// Check the configuration against the device limits.
    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(WorkQueueError::config("group_size must be non-zero"));
        }
        if self.group_size > self.limits.max_group_size {
            return Err(WorkQueueError::config(format!(
                "group_size {} exceeds hardware limit {}",
                self.group_size, self.limits.max_group_size
            )));
        }
        if self.num_groups == 0 {
            return Err(WorkQueueError::config("num_groups must be non-zero"));
        }
        if self.launch_capacity == 0 {
            return Err(WorkQueueError::config("launch_capacity must be non-zero"));
        }
        if self.pass_steps == 0 {
            return Err(WorkQueueError::config("pass_steps must be non-zero"));
        }
        Ok(())
    }
}

/// Builder for [`WorkQueueConfig`].
#[derive(Debug, Default)]
pub struct WorkQueueConfigBuilder {
    config: WorkQueueConfig,
}

impl WorkQueueConfigBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lanes per group.
    #[must_use]
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.config.group_size = group_size;
        self
    }

    /// Sets the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: QueueStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Sets the bounded-wait polling budget.
    #[must_use]
    pub fn with_max_condition_iterations(mut self, iterations: u64) -> Self {
        self.config.max_condition_iterations = iterations;
        self
    }

    /// Sets the number of resident groups.
    #[must_use]
    pub fn with_num_groups(mut self, num_groups: usize) -> Self {
        self.config.num_groups = num_groups;
        self
    }

    /// Sets the units admitted per host-driven launch.
    #[must_use]
    pub fn with_launch_capacity(mut self, capacity: usize) -> Self {
        self.config.launch_capacity = capacity;
        self
    }

    /// Sets the lockstep iterations per multi-pass pass.
    #[must_use]
    pub fn with_pass_steps(mut self, steps: u32) -> Self {
        self.config.pass_steps = steps;
        self
    }

    /// Sets the driver's starvation retry budget.
    #[must_use]
    pub fn with_starvation_retries(mut self, retries: u32) -> Self {
        self.config.starvation_retries = retries;
        self
    }

    /// Sets the launch limit.
    #[must_use]
    pub fn with_max_launches(mut self, launches: u64) -> Self {
        self.config.max_launches = Some(launches);
        self
    }

    /// Sets the device limits.
    #[must_use]
    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<WorkQueueConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
