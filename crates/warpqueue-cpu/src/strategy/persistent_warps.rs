//! Persistent-warps queue: resident groups that refill themselves.

use tracing::{debug, trace, warn};

use warpqueue_core::condition::{ConditionSet, WaitStatus};
use warpqueue_core::error::{Result, WorkQueueError};
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::work::WorkSource;

use super::LaunchContext;
use crate::grid::{self, GroupOutcome};
use crate::lockstep::ExecutionGroup;

/// Groups that have become resident in the current launch.
const RESIDENT: usize = 0;
/// Retirement rendezvous: every group signals it on exit, and the host
/// waits for all of them before summarizing the launch.
const DRAINED: usize = 1;

/// Single-launch queue whose groups stay resident until the source runs dry.
///
/// All groups rendezvous on a RESIDENT condition before their first pull. A
/// group whose bounded wait stays pending retires without touching the
/// cursor and is reported as starved; the dispatch driver decides whether to
/// relaunch. Resident groups refill all their idle lanes with one cursor
/// claim per refill, then signal DRAINED on exit. The launch only reports
/// once the host has seen DRAINED reach the group count.
#[derive(Debug)]
pub struct PersistentWarpsQueue {
    conditions: ConditionSet,
}

impl Default for PersistentWarpsQueue {
    fn default() -> Self {
        Self {
            conditions: ConditionSet::new(2),
        }
    }
}

impl PersistentWarpsQueue {
    /// Create a persistent-warps queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups that retired during the last launch.
    pub fn drained_groups(&self) -> u64 {
        self.conditions.get(DRAINED).count()
    }

    /// Launch the resident grid.
    pub fn launch<S: WorkSource>(&mut self, ctx: &LaunchContext<'_, S>) -> Result<LaunchReport> {
        let len = ctx.len();
        let groups = ctx.config.num_groups;
        let quota = groups as u64;
        let max_iterations = ctx.config.max_condition_iterations;
        let group_size = ctx.config.group_size;

        self.conditions.reset_all();
        let conditions = &self.conditions;

        debug!(
            "Persistent-warps launch: {} groups x {} lanes, {} units remaining",
            groups,
            group_size,
            len.saturating_sub(ctx.cursor.position())
        );

        let outcomes = grid::launch_resident(groups, |id| {
            let resident = conditions.get(RESIDENT);
            let drained = conditions.get(DRAINED);

            resident.signal();
            if let WaitStatus::Pending = resident.wait_bounded(quota, max_iterations) {
                let reached = resident.count();
                warn!(
                    "{} starved at residency barrier ({}/{} groups)",
                    id, reached, quota
                );
                drained.signal();
                return GroupOutcome::starved(quota, reached);
            }

            let mut group = ExecutionGroup::new(id, group_size);
            let mut outcome = GroupOutcome::default();
            loop {
                let idle = group.idle_lanes();
                if idle > 0 {
                    if let Some(range) = ctx.cursor.claim(idle, len) {
                        trace!("{} refilling {} lanes from {:?}", id, range.len(), range);
                        let mut units = range.map(|index| ctx.issue(index));
                        outcome.issued += group.refill(|| units.next());
                    }
                }
                if group.is_drained() {
                    break;
                }
                outcome.record(group.step(ctx.stats, ctx.results));
            }

            drained.signal();
            outcome
        })?;

        let drained = self.conditions.get(DRAINED);
        if let WaitStatus::Pending = drained.wait_bounded(quota, max_iterations) {
            return Err(WorkQueueError::kernel(format!(
                "{} of {} groups retired",
                drained.count(),
                quota
            )));
        }

        Ok(grid::summarize(&outcomes))
    }
}
