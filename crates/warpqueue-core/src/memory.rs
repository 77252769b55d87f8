//! Device memory footprint of a queue.
//!
//! A queue keeps one lane slot per lane of the grid, one result slot per
//! unit, and (for multi-pass) a batch buffer of in-flight units. The estimate
//! is checked against [`DeviceLimits::memory_bytes`] at construction.

use std::mem::size_of;

use crate::config::{DeviceLimits, QueueStrategy, WorkQueueConfig};
use crate::error::{Result, WorkQueueError};

/// Byte footprint of a queue's device-side state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceFootprint {
    /// Per-lane slots across the grid.
    pub lane_bytes: usize,
    /// Per-unit result slots.
    pub result_bytes: usize,
    /// Multi-pass batch buffer.
    pub batch_bytes: usize,
}

impl DeviceFootprint {
    /// Estimate the footprint for `units` units with the given lane slot,
    /// in-flight unit and result slot types.
    pub fn estimate<Lane, Unit, Slot>(config: &WorkQueueConfig, units: usize) -> Result<Self> {
        let overflow = || WorkQueueError::ResourceExhausted {
            requested: usize::MAX,
            available: config.limits.memory_bytes,
        };

        let lane_bytes = config
            .total_lanes()
            .checked_mul(size_of::<Lane>())
            .ok_or_else(overflow)?;
        let result_bytes = units.checked_mul(size_of::<Slot>()).ok_or_else(overflow)?;
        let batch_bytes = match config.strategy {
            QueueStrategy::MultiPass => config
                .launch_capacity
                .min(units)
                .checked_mul(size_of::<Unit>())
                .ok_or_else(overflow)?,
            _ => 0,
        };

        Ok(Self {
            lane_bytes,
            result_bytes,
            batch_bytes,
        })
    }

    /// Total bytes, saturating.
    pub fn total(&self) -> usize {
        self.lane_bytes
            .saturating_add(self.result_bytes)
            .saturating_add(self.batch_bytes)
    }

    /// Fail with `ResourceExhausted` if the footprint does not fit.
    pub fn check(&self, limits: &DeviceLimits) -> Result<()> {
        let requested = self.total();
        if requested > limits.memory_bytes {
            return Err(WorkQueueError::ResourceExhausted {
                requested,
                available: limits.memory_bytes,
            });
        }
        Ok(())
    }
}
