//! Persistent-threads queue: every lane feeds itself.

use tracing::debug;

use warpqueue_core::error::Result;
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::work::WorkSource;

use super::LaunchContext;
use crate::grid::{self, GroupOutcome};
use crate::lockstep::ExecutionGroup;

/// Single-launch queue in which each lane claims its own work.
///
/// Groups are resident for the whole launch but never rendezvous: there is
/// no residency barrier and no group-wide refill. Every idle lane issues its
/// own claim against the global cursor, so the cursor sees one atomic
/// operation per unit.
#[derive(Debug, Default)]
pub struct PersistentThreadsQueue {
    launches: u64,
}

impl PersistentThreadsQueue {
    /// Create a persistent-threads queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches performed.
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Launch the resident grid.
    pub fn launch<S: WorkSource>(&mut self, ctx: &LaunchContext<'_, S>) -> Result<LaunchReport> {
        let len = ctx.len();
        let group_size = ctx.config.group_size;
        let groups = ctx.config.num_groups;
        self.launches += 1;

        debug!(
            "Persistent-threads launch: {} lanes, {} units remaining",
            groups * group_size,
            len.saturating_sub(ctx.cursor.position())
        );

        let outcomes = grid::launch_resident(groups, |id| {
            let mut group = ExecutionGroup::new(id, group_size);
            let mut outcome = GroupOutcome::default();
            loop {
                outcome.issued += group.refill(|| {
                    ctx.cursor.claim_one(len).map(|index| ctx.issue(index))
                });
                if group.is_drained() {
                    break;
                }
                outcome.record(group.step(ctx.stats, ctx.results));
            }
            outcome
        })?;

        Ok(grid::summarize(&outcomes))
    }
}
