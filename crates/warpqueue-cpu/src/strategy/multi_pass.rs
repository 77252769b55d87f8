//! Multi-pass queue: lockstep batches compacted between passes.

use rayon::prelude::*;
use tracing::debug;

use warpqueue_core::error::Result;
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::types::GroupId;
use warpqueue_core::work::{InFlight, WorkSource, WorkUnit};

use super::LaunchContext;
use crate::grid::{self, GroupOutcome};
use crate::lockstep::ExecutionGroup;

/// Host-relaunched queue that runs a batch in fixed-length lockstep passes.
///
/// A pass binds the batch to groups up front (lane `i` of group `g` gets
/// batch entry `g * group_size + i`) and runs each group for `pass_steps`
/// iterations or until all its lanes are idle. Lanes whose unit finishes
/// early stay idle for the rest of the pass. Unfinished units are compacted,
/// in batch order, and lead the next pass's batch; fresh units fill the
/// remaining capacity.
#[derive(Debug)]
pub struct MultiPassQueue<U> {
    carry: Vec<InFlight<U>>,
    passes: u64,
}

impl<U> Default for MultiPassQueue<U> {
    fn default() -> Self {
        Self {
            carry: Vec::new(),
            passes: 0,
        }
    }
}

impl<U> MultiPassQueue<U> {
    /// Create a multi-pass queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units carried over to the next pass.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl<U: WorkUnit> MultiPassQueue<U> {
    /// Run one pass.
    pub fn launch<S>(&mut self, ctx: &LaunchContext<'_, S>) -> Result<LaunchReport>
    where
        S: WorkSource<Unit = U>,
    {
        let group_size = ctx.config.group_size;
        let capacity = ctx.config.launch_capacity.max(self.carry.len());
        let pass_steps = ctx.config.pass_steps;

        let mut batch = std::mem::take(&mut self.carry);
        let carried = batch.len();
        let fresh = ctx
            .cursor
            .claim(capacity - carried, ctx.len())
            .map(|range| {
                let issued = range.len();
                batch.extend(range.map(|index| ctx.issue(index)));
                issued
            })
            .unwrap_or(0);

        if batch.is_empty() {
            return Ok(LaunchReport::default());
        }
        self.passes += 1;

        let mut units = batch.into_iter();
        let mut groups = Vec::new();
        loop {
            let mut group = ExecutionGroup::new(GroupId::new(groups.len() as u32), group_size);
            if group.refill(|| units.next()) == 0 {
                break;
            }
            groups.push(group);
        }

        debug!(
            "Multi-pass launch {}: {} carried + {} fresh units over {} groups",
            self.passes,
            carried,
            fresh,
            groups.len()
        );

        let outcomes: Vec<GroupOutcome> = groups
            .par_iter_mut()
            .map(|group| {
                grid::contain(|| {
                    let mut outcome = GroupOutcome::default();
                    for _ in 0..pass_steps {
                        if group.is_drained() {
                            break;
                        }
                        outcome.record(group.step(ctx.stats, ctx.results));
                    }
                    outcome
                })
            })
            .collect::<Result<_>>()?;

        for group in groups.iter_mut() {
            self.carry.extend(group.retire());
        }

        let mut report = grid::summarize(&outcomes);
        report.units_issued = fresh;
        Ok(report)
    }
}
