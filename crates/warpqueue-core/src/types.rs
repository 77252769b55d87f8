//! Identity types for execution groups and lanes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hardware warp width; the default execution group size.
pub const WARP_SIZE: usize = 32;

/// Identifier of an execution group ("warp") within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl GroupId {
    /// Create a group id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Index of the group within the grid.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Identifier of a lane within its execution group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(pub u32);

impl LaneId {
    /// Create a lane id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Index of the lane within its group.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Global lane index across the grid.
    #[inline]
    pub const fn global(self, group: GroupId, group_size: usize) -> usize {
        group.index() * group_size + self.index()
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane#{}", self.0)
    }
}
