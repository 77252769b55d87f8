//! Host-side dispatch driver.
//!
//! The driver launches a [`LaunchTarget`] until it reports no remaining work.
//! Persistent strategies drain their source in one launch; host-driven
//! strategies need one launch per window or pass.
//!
//! Condition waits that give up early are not errors on their own. A launch
//! in which groups starved *and* nothing moved forward consumes one retry;
//! once the retry budget is spent the run is aborted with
//! [`WorkQueueError::StarvationTimeout`] instead of spinning forever.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::WorkQueueConfig;
use crate::error::{Result, WorkQueueError};
use crate::launch::LaunchTarget;
use crate::stats::WorkQueueStatsSnapshot;

/// Summary of a driven run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Launches performed by this call.
    pub launches: u64,
    /// Launches that starved without progress.
    pub starved_launches: u32,
    /// Statistics after the last launch.
    pub stats: WorkQueueStatsSnapshot,
}

/// Dispatch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    starvation_retries: u32,
    max_launches: Option<u64>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::from_config(&WorkQueueConfig::default())
    }
}

impl Dispatcher {
    /// Create a driver with the given retry budget and launch limit.
    pub fn new(starvation_retries: u32, max_launches: Option<u64>) -> Self {
        Self {
            starvation_retries,
            max_launches,
        }
    }

    /// Create a driver from queue configuration.
    pub fn from_config(config: &WorkQueueConfig) -> Self {
        Self::new(config.starvation_retries, config.max_launches)
    }

    /// Launch `target` until it has no work left.
    ///
    /// Returns immediately, without touching the statistics, if the target is
    /// already exhausted.
    pub fn drive<T: LaunchTarget + ?Sized>(&self, target: &mut T) -> Result<DispatchReport> {
        let mut launches = 0u64;
        let mut starved_launches = 0u32;

        while target.work_remaining() {
            if let Some(max) = self.max_launches {
                if launches >= max {
                    warn!("Aborting run: launch budget of {} exhausted", max);
                    return Err(WorkQueueError::LaunchBudgetExceeded { launches });
                }
            }

            let report = target.launch()?;
            launches += 1;

            debug!(
                "Launch {} finished (groups={}, issued={}, completed={}, iterations={})",
                launches,
                report.groups,
                report.units_issued,
                report.units_completed,
                report.iterations
            );

            if report.starved() {
                warn!(
                    "{} groups starved waiting for quota {} ({} signaled)",
                    report.starved_groups, report.starved_quota, report.starved_reached
                );
                if !report.made_progress() {
                    starved_launches += 1;
                    if starved_launches > self.starvation_retries {
                        return Err(WorkQueueError::StarvationTimeout {
                            quota: report.starved_quota,
                            reached: report.starved_reached,
                            retries: self.starvation_retries,
                        });
                    }
                }
            }
        }

        Ok(DispatchReport {
            launches,
            starved_launches,
            stats: target.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::LaunchReport;

    /// Target that completes one unit per launch, optionally starving first.
    struct ScriptedTarget {
        remaining: usize,
        starve_first: u32,
        launches: u64,
        stats: WorkQueueStatsSnapshot,
    }

    impl ScriptedTarget {
        fn new(remaining: usize, starve_first: u32) -> Self {
            Self {
                remaining,
                starve_first,
                launches: 0,
                stats: WorkQueueStatsSnapshot {
                    group_size: 32,
                    ..Default::default()
                },
            }
        }
    }

    impl LaunchTarget for ScriptedTarget {
        fn work_remaining(&self) -> bool {
            self.remaining > 0
        }

        fn launch(&mut self) -> Result<LaunchReport> {
            self.launches += 1;
            if self.starve_first > 0 {
                self.starve_first -= 1;
                return Ok(LaunchReport {
                    groups: 2,
                    starved_groups: 2,
                    starved_quota: 2,
                    starved_reached: 1,
                    ..Default::default()
                });
            }
            self.remaining -= 1;
            self.stats.issued_units += 1;
            self.stats.iterations += 1;
            self.stats.active_lanes += 1;
            Ok(LaunchReport {
                groups: 1,
                units_issued: 1,
                units_completed: 1,
                iterations: 1,
                ..Default::default()
            })
        }

        fn stats(&self) -> WorkQueueStatsSnapshot {
            self.stats
        }
    }

    #[test]
    fn test_drive_until_exhausted() {
        let mut target = ScriptedTarget::new(3, 0);
        let report = Dispatcher::new(0, None).drive(&mut target).unwrap();

        assert_eq!(report.launches, 3);
        assert_eq!(report.stats.issued_units, 3);
        assert!(!target.work_remaining());
    }

    #[test]
    fn test_exhausted_target_is_idempotent() {
        let mut target = ScriptedTarget::new(1, 0);
        let dispatcher = Dispatcher::default();
        let first = dispatcher.drive(&mut target).unwrap();

        let second = dispatcher.drive(&mut target).unwrap();
        assert_eq!(second.launches, 0);
        assert_eq!(second.stats, first.stats);
        assert_eq!(target.launches, 1);
    }

    #[test]
    fn test_starvation_retried_within_budget() {
        let mut target = ScriptedTarget::new(1, 2);
        let report = Dispatcher::new(2, None).drive(&mut target).unwrap();

        assert_eq!(report.launches, 3);
        assert_eq!(report.starved_launches, 2);
    }

    #[test]
    fn test_starvation_budget_exhausted() {
        let mut target = ScriptedTarget::new(1, 5);
        let err = Dispatcher::new(1, None).drive(&mut target).unwrap_err();

        assert_eq!(
            err,
            WorkQueueError::StarvationTimeout {
                quota: 2,
                reached: 1,
                retries: 1,
            }
        );
        assert_eq!(target.launches, 2);
    }

    #[test]
    fn test_launch_budget() {
        let mut target = ScriptedTarget::new(10, 0);
        let err = Dispatcher::new(0, Some(4)).drive(&mut target).unwrap_err();
        assert_eq!(err, WorkQueueError::LaunchBudgetExceeded { launches: 4 });
    }
}
