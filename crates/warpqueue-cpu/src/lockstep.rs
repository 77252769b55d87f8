//! Lockstep execution groups.
//!
//! An [`ExecutionGroup`] simulates one warp: a fixed number of lanes that
//! advance together. Each call to [`ExecutionGroup::step`] is one lockstep
//! iteration in which every bound lane executes exactly one step of its unit;
//! idle lanes still occupy the hardware and count as lost lane-time.

use tracing::trace;

use warpqueue_core::results::ResultSlots;
use warpqueue_core::stats::WorkQueueStats;
use warpqueue_core::types::{GroupId, LaneId};
use warpqueue_core::work::{InFlight, Step, WorkUnit};

/// One lane's binding to at most one in-flight unit.
#[derive(Debug)]
pub struct LaneSlot<U> {
    bound: Option<InFlight<U>>,
}

impl<U> Default for LaneSlot<U> {
    fn default() -> Self {
        Self { bound: None }
    }
}

impl<U: WorkUnit> LaneSlot<U> {
    /// Check if the lane can accept a unit.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.bound.is_none()
    }

    /// Source index of the bound unit.
    pub fn unit_index(&self) -> Option<usize> {
        self.bound.as_ref().map(|unit| unit.index)
    }

    /// Bind a unit to an idle lane.
    pub fn bind(&mut self, unit: InFlight<U>) {
        debug_assert!(self.is_idle(), "lane already holds unit {:?}", self.unit_index());
        self.bound = Some(unit);
    }

    /// Unbind the current unit, if any.
    pub fn take(&mut self) -> Option<InFlight<U>> {
        self.bound.take()
    }

    /// Execute one step. Returns the finished unit's index and output.
    fn advance(&mut self) -> Option<(usize, U::Output)> {
        let unit = self.bound.as_mut()?;
        match unit.advance() {
            Step::Continue => None,
            Step::Done(output) => {
                let index = unit.index;
                self.bound = None;
                Some((index, output))
            }
        }
    }
}

/// Result of one lockstep iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStep {
    /// Lanes that executed a step.
    pub active: usize,
    /// Units that finished in this iteration.
    pub completed: usize,
}

/// A fixed-size group of lanes executing in lockstep.
#[derive(Debug)]
pub struct ExecutionGroup<U> {
    id: GroupId,
    lanes: Vec<LaneSlot<U>>,
}

impl<U: WorkUnit> ExecutionGroup<U> {
    /// Create a group of `size` idle lanes.
    pub fn new(id: GroupId, size: usize) -> Self {
        let mut lanes = Vec::with_capacity(size);
        lanes.resize_with(size, LaneSlot::default);
        Self { id, lanes }
    }

    /// Group identifier.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Lanes in the group.
    pub fn size(&self) -> usize {
        self.lanes.len()
    }

    /// Lanes currently holding a unit.
    pub fn active_lanes(&self) -> usize {
        self.lanes.iter().filter(|lane| !lane.is_idle()).count()
    }

    /// Lanes free to accept a unit.
    pub fn idle_lanes(&self) -> usize {
        self.size() - self.active_lanes()
    }

    /// Check whether every lane is idle.
    pub fn is_drained(&self) -> bool {
        self.lanes.iter().all(LaneSlot::is_idle)
    }

    /// Lane slot accessor.
    pub fn lane(&self, lane: LaneId) -> &LaneSlot<U> {
        &self.lanes[lane.index()]
    }

    /// Bind units to idle lanes, in lane order, until `next` runs dry.
    ///
    /// Returns the number of units bound. `next` is not called once every
    /// lane is busy, so no unit is acquired without a lane to run it.
    pub fn refill<F>(&mut self, mut next: F) -> usize
    where
        F: FnMut() -> Option<InFlight<U>>,
    {
        let id = self.id;
        let size = self.lanes.len();
        let mut bound = 0;
        for (lane, slot) in self.lanes.iter_mut().enumerate() {
            if !slot.is_idle() {
                continue;
            }
            match next() {
                Some(unit) => {
                    trace!(
                        "{} lane {} (global {}) <- unit {}, {:?} steps",
                        id,
                        lane,
                        LaneId::new(lane as u32).global(id, size),
                        unit.index,
                        unit.remaining_steps()
                    );
                    slot.bind(unit);
                    bound += 1;
                }
                None => break,
            }
        }
        bound
    }

    /// Run one lockstep iteration.
    ///
    /// Finished units are written to `results` under their source index and
    /// their lanes become idle. Nothing is recorded when no lane is active.
    pub fn step(
        &mut self,
        stats: &WorkQueueStats,
        results: &ResultSlots<U::Output>,
    ) -> GroupStep {
        let active = self.active_lanes();
        if active == 0 {
            return GroupStep::default();
        }

        let mut completed = 0;
        for slot in self.lanes.iter_mut() {
            if let Some((index, output)) = slot.advance() {
                results.store(index, output);
                completed += 1;
            }
        }
        stats.record_iteration(active);

        GroupStep { active, completed }
    }

    /// Unbind every in-flight unit, in lane order.
    pub fn retire(&mut self) -> impl Iterator<Item = InFlight<U>> + '_ {
        self.lanes.iter_mut().filter_map(LaneSlot::take)
    }
}
