//! Work queue utilization statistics.
//!
//! Lanes accumulate into [`WorkQueueStats`] with relaxed atomic adds while a
//! run is in flight; the host reads a [`WorkQueueStatsSnapshot`] once the run
//! completes. Counters only grow: there is no subtraction and no reset short
//! of building a new queue.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live, device-side counters.
#[derive(Debug)]
pub struct WorkQueueStats {
    group_size: usize,
    /// Sum over lockstep iterations of the lanes holding a unit.
    active_lanes: AtomicU64,
    /// Units handed to lanes for the first time.
    issued_units: AtomicU64,
    /// Lockstep group iterations executed.
    iterations: AtomicU64,
}

impl WorkQueueStats {
    /// Create zeroed counters for groups of `group_size` lanes.
    pub fn new(group_size: usize) -> Self {
        Self {
            group_size,
            active_lanes: AtomicU64::new(0),
            issued_units: AtomicU64::new(0),
            iterations: AtomicU64::new(0),
        }
    }

    /// Lanes per execution group.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Record one lockstep iteration of a group with `active` busy lanes.
    #[inline]
    pub fn record_iteration(&self, active: usize) {
        self.active_lanes.fetch_add(active as u64, Ordering::Relaxed);
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` units issued from the source.
    #[inline]
    pub fn record_issue(&self, count: usize) {
        self.issued_units.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Read the counters.
    ///
    /// Only authoritative once all device work has completed; a snapshot taken
    /// mid-run is partial.
    pub fn snapshot(&self) -> WorkQueueStatsSnapshot {
        WorkQueueStatsSnapshot {
            group_size: self.group_size,
            active_lanes: self.active_lanes.load(Ordering::Acquire),
            issued_units: self.issued_units.load(Ordering::Acquire),
            iterations: self.iterations.load(Ordering::Acquire),
        }
    }
}

/// Host-side summary of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQueueStatsSnapshot {
    /// Lanes per execution group.
    pub group_size: usize,
    /// Sum over lockstep iterations of the lanes holding a unit.
    pub active_lanes: u64,
    /// Units issued.
    pub issued_units: u64,
    /// Lockstep group iterations executed.
    pub iterations: u64,
}

impl WorkQueueStatsSnapshot {
    /// Total lane-time: every lane of every group iteration, busy or not.
    #[must_use]
    pub fn lane_time(&self) -> u64 {
        self.iterations * self.group_size as u64
    }

    /// Fraction of lane-time spent on active work, in `[0, 1]`.
    ///
    /// Zero when nothing ran.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        let lane_time = self.lane_time();
        if lane_time == 0 {
            return 0.0;
        }
        (self.active_lanes as f64 / lane_time as f64).min(1.0)
    }

    /// Lane-iterations spent idle inside a running group.
    #[must_use]
    pub fn idle_lane_iterations(&self) -> u64 {
        self.lane_time().saturating_sub(self.active_lanes)
    }

    /// Mean number of busy lanes per group iteration.
    #[must_use]
    pub fn avg_active_lanes(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.active_lanes as f64 / self.iterations as f64
    }

    /// Mean steps executed per issued unit.
    #[must_use]
    pub fn avg_steps_per_unit(&self) -> f64 {
        if self.issued_units == 0 {
            return 0.0;
        }
        self.active_lanes as f64 / self.issued_units as f64
    }

    /// Fold another snapshot of the same group size into this one.
    pub fn merge(&mut self, other: &WorkQueueStatsSnapshot) {
        debug_assert!(self.group_size == 0 || self.group_size == other.group_size);
        self.group_size = other.group_size;
        self.active_lanes += other.active_lanes;
        self.issued_units += other.issued_units;
        self.iterations += other.iterations;
    }
}

impl fmt::Display for WorkQueueStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkQueue Stats: issued={}, iterations={}, active_lanes={} ({:.1}% utilization, {:.2} lanes/iter)",
            self.issued_units,
            self.iterations,
            self.active_lanes,
            self.utilization() * 100.0,
            self.avg_active_lanes()
        )
    }
}
