//! Ordered queue: units drain strictly in input order.

use tracing::{debug, trace};

use warpqueue_core::error::Result;
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::work::WorkSource;

use super::{groups_for, LaunchContext};
use crate::grid::{self, GroupOutcome};
use crate::lockstep::ExecutionGroup;

/// Host-relaunched queue that hands out indices one lane at a time.
///
/// Each launch opens a window of `launch_capacity` units starting at the
/// cursor. Whenever a lane goes idle it claims the next unissued index of the
/// window with a single atomic operation, so indices are issued in strictly
/// increasing order. Every unit of a window finishes inside its launch.
#[derive(Debug, Default)]
pub struct OrderedQueue {
    windows: u64,
}

impl OrderedQueue {
    /// Create an ordered queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Windows launched so far.
    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Process the next window.
    pub fn launch<S: WorkSource>(&mut self, ctx: &LaunchContext<'_, S>) -> Result<LaunchReport> {
        let start = ctx.cursor.position();
        let limit = start.saturating_add(ctx.config.launch_capacity).min(ctx.len());
        if start >= limit {
            return Ok(LaunchReport::default());
        }

        let group_size = ctx.config.group_size;
        let groups = ctx
            .config
            .num_groups
            .min(groups_for(limit - start, group_size));
        self.windows += 1;

        debug!(
            "Ordered launch {}: window [{}, {}) over {} groups",
            self.windows, start, limit, groups
        );

        let outcomes = grid::launch_parallel(groups, |id| {
            let mut group = ExecutionGroup::new(id, group_size);
            let mut outcome = GroupOutcome::default();

            loop {
                outcome.issued += group.refill(|| {
                    ctx.cursor.claim_one(limit).map(|index| ctx.issue(index))
                });
                if group.is_drained() {
                    break;
                }
                outcome.record(group.step(ctx.stats, ctx.results));
            }

            trace!("{} retired after {} iterations", id, outcome.iterations);
            outcome
        })?;

        Ok(grid::summarize(&outcomes))
    }
}
