//! Work queue front-end.
//!
//! [`WorkQueue`] owns everything a run needs: the source, the global issue
//! cursor, live statistics, per-unit result slots and the strategy kernel.
//! It implements [`LaunchTarget`] so the [`Dispatcher`] can relaunch it until
//! the source is drained.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use warpqueue_core::config::{QueueStrategy, WorkQueueConfig};
use warpqueue_core::cursor::WorkCursor;
use warpqueue_core::dispatcher::{DispatchReport, Dispatcher};
use warpqueue_core::error::{Result, WorkQueueError};
use warpqueue_core::launch::{LaunchReport, LaunchTarget};
use warpqueue_core::memory::DeviceFootprint;
use warpqueue_core::results::ResultSlots;
use warpqueue_core::stats::{WorkQueueStats, WorkQueueStatsSnapshot};
use warpqueue_core::work::{InFlight, UnitOutput, WorkSource};

use crate::lockstep::LaneSlot;
use crate::strategy::{LaunchContext, QueueKernel};

/// Results and statistics of a finished run.
#[derive(Debug)]
pub struct QueueOutput<T> {
    /// Unit outputs, indexed by the unit's position in the source.
    pub results: Vec<T>,
    /// Final statistics.
    pub stats: WorkQueueStatsSnapshot,
    /// Launches performed.
    pub launches: u64,
}

/// Work queue over a [`WorkSource`].
pub struct WorkQueue<S: WorkSource> {
    config: WorkQueueConfig,
    source: S,
    cursor: Arc<WorkCursor>,
    stats: WorkQueueStats,
    results: ResultSlots<UnitOutput<S>>,
    kernel: QueueKernel<S::Unit>,
    launches: u64,
}

impl<S: WorkSource> WorkQueue<S> {
    /// Create a queue with its own issue cursor.
    pub fn new(config: WorkQueueConfig, source: S) -> Result<Self> {
        Self::with_cursor(config, source, Arc::new(WorkCursor::new()))
    }

    /// Create a queue around an externally owned issue cursor.
    ///
    /// The cursor must not have issued anything yet; its position is the
    /// next index the queue hands out.
    pub fn with_cursor(config: WorkQueueConfig, source: S, cursor: Arc<WorkCursor>) -> Result<Self> {
        config.validate()?;
        if cursor.position() != 0 {
            return Err(WorkQueueError::config(format!(
                "work cursor already at position {}",
                cursor.position()
            )));
        }

        let units = source.len();
        let footprint = DeviceFootprint::estimate::<
            LaneSlot<S::Unit>,
            InFlight<S::Unit>,
            Mutex<Option<UnitOutput<S>>>,
        >(&config, units)?;
        footprint.check(&config.limits)?;

        info!(
            "Created {} work queue: {} units, {} groups x {} lanes, {} bytes device state",
            config.strategy,
            units,
            config.num_groups,
            config.group_size,
            footprint.total()
        );

        Ok(Self {
            stats: WorkQueueStats::new(config.group_size),
            results: ResultSlots::new(units),
            kernel: QueueKernel::for_strategy(config.strategy),
            config,
            source,
            cursor,
            launches: 0,
        })
    }

    /// Queue configuration.
    pub fn config(&self) -> &WorkQueueConfig {
        &self.config
    }

    /// Selected strategy.
    pub fn strategy(&self) -> QueueStrategy {
        self.kernel.strategy()
    }

    /// Number of units in the source.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Shared issue cursor.
    pub fn cursor(&self) -> &Arc<WorkCursor> {
        &self.cursor
    }

    /// Units that have produced their output.
    pub fn completed(&self) -> usize {
        self.results.completed()
    }

    /// Launches performed so far.
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Statistics snapshot. Partial while a run is in progress.
    pub fn stats(&self) -> WorkQueueStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drive the queue until every unit has finished.
    ///
    /// Calling `run` again after completion performs no launches and leaves
    /// the statistics unchanged.
    pub fn run(&mut self) -> Result<DispatchReport> {
        let report = Dispatcher::from_config(&self.config).drive(self)?;
        if report.launches > 0 {
            info!(
                "{} queue finished in {} launches: {}",
                self.config.strategy, report.launches, report.stats
            );
        }
        Ok(report)
    }

    /// Consume the queue and collect its outputs.
    ///
    /// Fails with `IncompleteRun` if any unit has not finished.
    pub fn into_output(self) -> Result<QueueOutput<UnitOutput<S>>> {
        let stats = self.stats.snapshot();
        let launches = self.launches;
        let results = self.results.into_vec()?;
        Ok(QueueOutput {
            results,
            stats,
            launches,
        })
    }

    /// Run to completion and collect the outputs.
    pub fn process(mut self) -> Result<QueueOutput<UnitOutput<S>>> {
        self.run()?;
        self.into_output()
    }
}

impl<S: WorkSource> LaunchTarget for WorkQueue<S> {
    fn work_remaining(&self) -> bool {
        !self.cursor.is_exhausted(self.source.len()) || self.kernel.in_flight() > 0
    }

    fn launch(&mut self) -> Result<LaunchReport> {
        let ctx = LaunchContext {
            source: &self.source,
            config: &self.config,
            cursor: &self.cursor,
            stats: &self.stats,
            results: &self.results,
        };
        let report = self.kernel.launch(&ctx)?;
        self.launches += 1;
        debug!(
            "{} launch {}: {} issued, {} completed ({}/{} done)",
            self.config.strategy,
            self.launches,
            report.units_issued,
            report.units_completed,
            self.results.completed(),
            self.source.len()
        );
        Ok(report)
    }

    fn stats(&self) -> WorkQueueStatsSnapshot {
        self.stats.snapshot()
    }
}
