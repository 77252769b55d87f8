//! Per-unit result slots, keyed by original unit index.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Result, WorkQueueError};

/// Write-once result storage shared by all lanes.
///
/// Results land at the unit's source index regardless of completion order.
pub struct ResultSlots<T> {
    slots: Vec<Mutex<Option<T>>>,
    completed: AtomicUsize,
}

impl<T> ResultSlots<T> {
    /// Allocate `len` empty slots.
    pub fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        for _ in 0..len {
            slots.push(Mutex::new(None));
        }
        Self {
            slots,
            completed: AtomicUsize::new(0),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store the result for `index`.
    ///
    /// Returns `false` and keeps the first value if the slot was already
    /// written, which means a unit was processed twice.
    pub fn store(&self, index: usize, value: T) -> bool {
        let mut slot = self.slots[index].lock();
        debug_assert!(slot.is_none(), "work unit {} completed twice", index);
        if slot.is_some() {
            warn!("Duplicate result for work unit {}", index);
            return false;
        }
        *slot = Some(value);
        drop(slot);
        self.completed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of slots written.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Take all results in index order.
    pub fn into_vec(self) -> Result<Vec<T>> {
        let values: Vec<Option<T>> = self.slots.into_iter().map(Mutex::into_inner).collect();
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            return Err(WorkQueueError::IncompleteRun { missing });
        }
        Ok(values.into_iter().flatten().collect())
    }
}
