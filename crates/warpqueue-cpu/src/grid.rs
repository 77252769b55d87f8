//! Grid execution of simulated groups.
//!
//! Host-driven launches hand their groups to the rayon pool: groups of one
//! launch never wait on each other, so they may run in any order or
//! interleaving. Persistent launches need every group resident at once (they
//! rendezvous on conditions), so each group gets its own scoped thread.
//!
//! Either way a group that panics is contained: the launch reports a
//! [`WorkQueueError::KernelFault`] instead of unwinding into the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use warpqueue_core::error::{Result, WorkQueueError};
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::types::GroupId;

use crate::lockstep::GroupStep;

/// Per-group tally of a launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    /// Units issued from the source by this group.
    pub issued: usize,
    /// Units this group finished.
    pub completed: usize,
    /// Lockstep iterations the group executed.
    pub iterations: u64,
    /// `(quota, reached)` if the group starved at a condition.
    pub starved: Option<(u64, u64)>,
}

impl GroupOutcome {
    /// Outcome of a group that gave up waiting for `quota` signals.
    pub fn starved(quota: u64, reached: u64) -> Self {
        Self {
            starved: Some((quota, reached)),
            ..Self::default()
        }
    }

    /// Account one lockstep iteration.
    #[inline]
    pub fn record(&mut self, step: GroupStep) {
        if step.active > 0 {
            self.iterations += 1;
        }
        self.completed += step.completed;
    }
}

/// Fold group outcomes into a launch report.
pub fn summarize(outcomes: &[GroupOutcome]) -> LaunchReport {
    let mut report = LaunchReport {
        groups: outcomes.len(),
        ..LaunchReport::default()
    };
    for outcome in outcomes {
        report.units_issued += outcome.issued;
        report.units_completed += outcome.completed;
        report.iterations += outcome.iterations;
        if let Some((quota, reached)) = outcome.starved {
            report.starved_groups += 1;
            report.starved_quota = quota;
            report.starved_reached = reached;
        }
    }
    report
}

/// Run one group body, turning a panic into a kernel fault.
pub fn contain<F>(body: F) -> Result<GroupOutcome>
where
    F: FnOnce() -> GroupOutcome,
{
    catch_unwind(AssertUnwindSafe(body)).map_err(WorkQueueError::from_panic)
}

/// Run `groups` independent groups on the rayon pool.
pub fn launch_parallel<F>(groups: usize, body: F) -> Result<Vec<GroupOutcome>>
where
    F: Fn(GroupId) -> GroupOutcome + Sync + Send,
{
    (0..groups)
        .into_par_iter()
        .map(|g| contain(|| body(GroupId::new(g as u32))))
        .collect()
}

/// Run `groups` co-resident groups, one scoped thread each.
///
/// A group that panics or cannot be spawned turns the launch into a
/// [`WorkQueueError::KernelFault`] once every spawned group has been joined.
pub fn launch_resident<F>(groups: usize, body: F) -> Result<Vec<GroupOutcome>>
where
    F: Fn(GroupId) -> GroupOutcome + Sync,
{
    std::thread::scope(|scope| {
        let body = &body;
        let spawned: Vec<_> = (0..groups)
            .map(|g| {
                std::thread::Builder::new()
                    .name(format!("warpqueue-group-{}", g))
                    .spawn_scoped(scope, move || body(GroupId::new(g as u32)))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(groups);
        let mut fault = None;
        for handle in spawned {
            match handle {
                Ok(handle) => match handle.join() {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(payload) => {
                        fault.get_or_insert(WorkQueueError::from_panic(payload));
                    }
                },
                Err(e) => {
                    fault.get_or_insert(WorkQueueError::kernel(format!(
                        "failed to start group: {}",
                        e
                    )));
                }
            }
        }

        match fault {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    })
}
