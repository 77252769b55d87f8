//! # warpqueue core
//!
//! Backend-agnostic contracts for the warpqueue SIMT work-distribution
//! engine.
//!
//! Thousands of execution lanes, grouped into fixed-size lockstep groups
//! ("warps"), are fed variable-cost work units. The scheduler keeps lanes busy
//! by handing finished lanes new work without stalling the whole group on its
//! slowest member.
//!
//! ## Core Abstractions
//!
//! - [`WorkUnit`] / [`WorkSource`] - opaque units of work and the indexable stream they come from
//! - [`Condition`] - cross-lane counter with bounded, non-fatal waits
//! - [`WorkCursor`] - the global issue counter all lanes claim indices from
//! - [`WorkQueueStats`] - live utilization counters and their host snapshot
//! - [`LaunchTarget`] / [`Dispatcher`] - the host-side launch loop
//!
//! Backends (see `warpqueue-cpu`) implement the four queueing strategies on
//! top of these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod condition;
pub mod config;
pub mod cursor;
pub mod dispatcher;
pub mod error;
pub mod launch;
pub mod memory;
pub mod results;
pub mod stats;
pub mod types;
pub mod work;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::condition::{Condition, ConditionSet, WaitStatus};
    pub use crate::config::{
        DeviceLimits, QueueStrategy, WorkQueueConfig, WorkQueueConfigBuilder,
    };
    pub use crate::cursor::WorkCursor;
    pub use crate::dispatcher::{DispatchReport, Dispatcher};
    pub use crate::error::*;
    pub use crate::launch::{LaunchReport, LaunchTarget};
    pub use crate::memory::DeviceFootprint;
    pub use crate::results::ResultSlots;
    pub use crate::stats::{WorkQueueStats, WorkQueueStatsSnapshot};
    pub use crate::types::*;
    pub use crate::work::{from_fn, InFlight, SourceFn, Step, UnitOutput, WorkSource, WorkUnit};
}

// Re-exports for convenience
pub use condition::{Condition, ConditionSet, WaitStatus};
pub use config::{QueueStrategy, WorkQueueConfig};
pub use cursor::WorkCursor;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{Result, WorkQueueError};
pub use launch::{LaunchReport, LaunchTarget};
pub use stats::{WorkQueueStats, WorkQueueStatsSnapshot};
pub use types::{GroupId, LaneId, WARP_SIZE};
pub use work::{InFlight, Step, UnitOutput, WorkSource, WorkUnit};
