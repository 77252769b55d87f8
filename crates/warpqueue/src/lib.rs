//! # warpqueue
//!
//! Dynamic work distribution for massively parallel SIMT execution groups.
//!
//! A [`WorkQueue`] feeds a finite stream of variable-cost [`WorkUnit`]s to a
//! grid of lockstep execution groups ("warps"). Lanes that finish early are
//! handed new work without waiting for the slowest lane of their group, and
//! [`WorkQueueStats`] measures how much lane-time was actually spent on
//! work.
//!
//! ## Strategies
//!
//! - **Ordered** - units are issued strictly in input order, one window per
//!   host launch
//! - **Multi-pass** - lockstep batches, compacted between host launches
//! - **Persistent warps** - a single launch of resident groups that refill
//!   all idle lanes with one atomic claim
//! - **Persistent threads** - a single launch in which every lane claims its
//!   own work
//!
//! ## Quick Start
//!
//! ```
//! use warpqueue::prelude::*;
//!
//! struct Extend {
//!     id: usize,
//!     left: u32,
//! }
//!
//! impl WorkUnit for Extend {
//!     type Output = (usize, u32);
//!
//!     fn step(&mut self) -> Step<Self::Output> {
//!         self.left -= 1;
//!         match self.left {
//!             0 => Step::Done((self.id, self.id as u32 % 13)),
//!             _ => Step::Continue,
//!         }
//!     }
//! }
//!
//! let config = WorkQueueConfigBuilder::new()
//!     .with_strategy(QueueStrategy::MultiPass)
//!     .with_group_size(16)
//!     .with_num_groups(4)
//!     .build()?;
//!
//! let source = from_fn(1000, |id| Extend { id, left: (id % 13) as u32 + 1 });
//! let output = WorkQueue::new(config, source)?.process()?;
//!
//! assert_eq!(output.results[42], (42, 3));
//! println!("{}", output.stats);
//! # Ok::<(), WorkQueueError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(hidden_glob_reexports)]

// Re-export core types
pub use warpqueue_core::*;

// Re-export the simulated backend
pub use warpqueue_cpu::{QueueOutput, WorkQueue};

/// Strategy kernels and lockstep building blocks.
pub use warpqueue_cpu as cpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use warpqueue_core::prelude::*;
    pub use warpqueue_cpu::{QueueOutput, WorkQueue};
}

