//! # warpqueue CPU backend
//!
//! Simulated SIMT backend for warpqueue. Execution groups are plain structs
//! of lane slots stepped in lockstep; groups of one launch run on rayon
//! (host-driven strategies) or on one scoped thread each (persistent
//! strategies, which need every group resident at once).
//!
//! ## Example
//!
//! ```
//! use warpqueue_core::prelude::*;
//! use warpqueue_cpu::WorkQueue;
//!
//! struct Countdown(usize, u32);
//!
//! impl WorkUnit for Countdown {
//!     type Output = usize;
//!
//!     fn step(&mut self) -> Step<usize> {
//!         self.1 -= 1;
//!         if self.1 == 0 { Step::Done(self.0) } else { Step::Continue }
//!     }
//! }
//!
//! let source = from_fn(100, |i| Countdown(i, (i % 9) as u32 + 1));
//! let output = WorkQueue::new(WorkQueueConfig::persistent_threads(), source)?.process()?;
//! assert_eq!(output.results.len(), 100);
//! # Ok::<(), WorkQueueError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod grid;
pub mod lockstep;
pub mod queue;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use lockstep::{ExecutionGroup, GroupStep, LaneSlot};
pub use queue::{QueueOutput, WorkQueue};
pub use strategy::{
    LaunchContext, MultiPassQueue, OrderedQueue, PersistentThreadsQueue, PersistentWarpsQueue,
    QueueKernel,
};
