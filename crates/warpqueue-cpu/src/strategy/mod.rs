//! Queueing strategies.
//!
//! Every strategy honours the same contract: each unit index is issued
//! exactly once, no index is skipped, and a lane never holds two units. They
//! differ only in how idle lanes acquire new work:
//!
//! | Strategy | Launches | Acquisition |
//! |---|---|---|
//! | [`OrderedQueue`] | one per window | one cursor claim per idle lane |
//! | [`MultiPassQueue`] | one per pass | batch bound up front, compacted between passes |
//! | [`PersistentWarpsQueue`] | one | one cursor claim per group refill |
//! | [`PersistentThreadsQueue`] | one | one cursor claim per idle lane |

mod multi_pass;
mod ordered;
mod persistent_threads;
mod persistent_warps;

pub use multi_pass::MultiPassQueue;
pub use ordered::OrderedQueue;
pub use persistent_threads::PersistentThreadsQueue;
pub use persistent_warps::PersistentWarpsQueue;

use warpqueue_core::config::{QueueStrategy, WorkQueueConfig};
use warpqueue_core::cursor::WorkCursor;
use warpqueue_core::error::Result;
use warpqueue_core::launch::LaunchReport;
use warpqueue_core::results::ResultSlots;
use warpqueue_core::stats::WorkQueueStats;
use warpqueue_core::work::{InFlight, UnitOutput, WorkSource, WorkUnit};

/// Shared state a kernel launch operates on.
pub struct LaunchContext<'a, S: WorkSource> {
    /// Work source.
    pub source: &'a S,
    /// Queue configuration.
    pub config: &'a WorkQueueConfig,
    /// Global issue cursor.
    pub cursor: &'a WorkCursor,
    /// Live statistics.
    pub stats: &'a WorkQueueStats,
    /// Per-unit results.
    pub results: &'a ResultSlots<UnitOutput<S>>,
}

impl<'a, S: WorkSource> LaunchContext<'a, S> {
    /// Fetch unit `index` from the source and count it as issued.
    #[inline]
    pub fn issue(&self, index: usize) -> InFlight<S::Unit> {
        self.stats.record_issue(1);
        InFlight::new(index, self.source.fetch(index))
    }

    /// Number of units in the source.
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if the source is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Strategy selected for a queue, with any state it carries between launches.
pub enum QueueKernel<U> {
    /// Ordered queue.
    Ordered(OrderedQueue),
    /// Multi-pass queue.
    MultiPass(MultiPassQueue<U>),
    /// Persistent-warps queue.
    PersistentWarps(PersistentWarpsQueue),
    /// Persistent-threads queue.
    PersistentThreads(PersistentThreadsQueue),
}

impl<U> QueueKernel<U> {
    /// Build the kernel for a strategy.
    pub fn for_strategy(strategy: QueueStrategy) -> Self {
        match strategy {
            QueueStrategy::Ordered => QueueKernel::Ordered(OrderedQueue::new()),
            QueueStrategy::MultiPass => QueueKernel::MultiPass(MultiPassQueue::new()),
            QueueStrategy::PersistentWarps => {
                QueueKernel::PersistentWarps(PersistentWarpsQueue::new())
            }
            QueueStrategy::PersistentThreads => {
                QueueKernel::PersistentThreads(PersistentThreadsQueue::new())
            }
        }
    }

    /// Strategy tag.
    pub fn strategy(&self) -> QueueStrategy {
        match self {
            QueueKernel::Ordered(_) => QueueStrategy::Ordered,
            QueueKernel::MultiPass(_) => QueueStrategy::MultiPass,
            QueueKernel::PersistentWarps(_) => QueueStrategy::PersistentWarps,
            QueueKernel::PersistentThreads(_) => QueueStrategy::PersistentThreads,
        }
    }

    /// Units issued but not yet finished, held between launches.
    pub fn in_flight(&self) -> usize {
        match self {
            QueueKernel::MultiPass(queue) => queue.pending(),
            _ => 0,
        }
    }
}

impl<U: WorkUnit> QueueKernel<U> {
    /// Run one launch of the selected strategy.
    pub fn launch<S>(&mut self, ctx: &LaunchContext<'_, S>) -> Result<LaunchReport>
    where
        S: WorkSource<Unit = U>,
    {
        match self {
            QueueKernel::Ordered(queue) => queue.launch(ctx),
            QueueKernel::MultiPass(queue) => queue.launch(ctx),
            QueueKernel::PersistentWarps(queue) => queue.launch(ctx),
            QueueKernel::PersistentThreads(queue) => queue.launch(ctx),
        }
    }
}

/// Ceiling division for group counts.
#[inline]
pub(crate) fn groups_for(units: usize, group_size: usize) -> usize {
    units.div_ceil(group_size)
}
