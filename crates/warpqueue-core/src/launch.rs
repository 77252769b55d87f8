//! Launch contract between a queue backend and the dispatch driver.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stats::WorkQueueStatsSnapshot;

/// Outcome of one device-side processing step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchReport {
    /// Execution groups that took part in the launch.
    pub groups: usize,
    /// Units that finished during the launch.
    pub units_completed: usize,
    /// Units issued from the source for the first time.
    pub units_issued: usize,
    /// Lockstep group iterations executed.
    pub iterations: u64,
    /// Groups that gave up on a condition wait and retired without work.
    pub starved_groups: usize,
    /// Quota the starved groups were waiting for.
    pub starved_quota: u64,
    /// Signals the last starved group observed.
    pub starved_reached: u64,
}

impl LaunchReport {
    /// Whether the launch moved any unit forward.
    pub fn made_progress(&self) -> bool {
        self.units_completed > 0 || self.units_issued > 0 || self.iterations > 0
    }

    /// Whether any group starved.
    pub fn starved(&self) -> bool {
        self.starved_groups > 0
    }
}

/// A queue the dispatch driver can launch repeatedly.
pub trait LaunchTarget {
    /// Check if any unit is still unissued or in flight.
    fn work_remaining(&self) -> bool;

    /// Run one device-side processing step.
    fn launch(&mut self) -> Result<LaunchReport>;

    /// Current statistics.
    fn stats(&self) -> WorkQueueStatsSnapshot;
}
