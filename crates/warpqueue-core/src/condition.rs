//! Cross-lane condition counters.
//!
//! A [`Condition`] is a view over a shared, monotonically increasing counter.
//! Group members [`signal`](Condition::signal) it when they reach a point and
//! [`wait`](Condition::wait) until a quota of peers has done the same. The
//! bounded variant gives up after a fixed number of polling iterations and
//! reports [`WaitStatus::Pending`]; that is a cooperative re-poll hint, not a
//! timeout error.
//!
//! Counters never decrease except through an explicit [`reset`](Condition::reset)
//! between synchronization episodes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Polling iterations spent in `spin_loop` before yielding the thread.
const SPIN_LIMIT: u64 = 64;

/// Result of a bounded condition wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WaitStatus {
    /// The quota was reached.
    Released,
    /// The iteration budget ran out first. Poll again or abandon the episode.
    Pending,
}

impl WaitStatus {
    /// Check if the wait was released.
    #[inline]
    pub fn is_released(self) -> bool {
        matches!(self, WaitStatus::Released)
    }
}

/// View over a shared condition counter.
///
/// Does not own the counter; copies refer to the same location.
#[derive(Debug, Clone, Copy)]
pub struct Condition<'a> {
    counter: &'a AtomicU64,
}

impl<'a> Condition<'a> {
    /// Create a view over an existing counter.
    pub fn from_counter(counter: &'a AtomicU64) -> Self {
        Self { counter }
    }

    /// Signal arrival. Returns the counter value including this signal.
    #[inline]
    pub fn signal(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Current number of signals.
    #[inline]
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Check whether `quota` signals have arrived.
    #[inline]
    pub fn is_satisfied(&self, quota: u64) -> bool {
        self.count() >= quota
    }

    /// Block until `quota` members have signaled.
    ///
    /// Returns immediately for a quota of zero.
    pub fn wait(&self, quota: u64) {
        let mut iteration = 0u64;
        while !self.is_satisfied(quota) {
            backoff(iteration);
            iteration = iteration.saturating_add(1);
        }
    }

    /// Wait for `quota` signals, polling at most `max_iterations` times after
    /// the initial check.
    pub fn wait_bounded(&self, quota: u64, max_iterations: u64) -> WaitStatus {
        if self.is_satisfied(quota) {
            return WaitStatus::Released;
        }
        for iteration in 0..max_iterations {
            backoff(iteration);
            if self.is_satisfied(quota) {
                return WaitStatus::Released;
            }
        }
        WaitStatus::Pending
    }

    /// Reset the counter for a new episode.
    ///
    /// Must not race with waiters of the previous episode.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::Release);
    }
}

#[inline]
fn backoff(iteration: u64) {
    if iteration < SPIN_LIMIT {
        std::hint::spin_loop();
    } else {
        std::thread::yield_now();
    }
}

/// Owned storage for a fixed set of condition counters.
#[derive(Debug)]
pub struct ConditionSet {
    counters: Box<[AtomicU64]>,
}

impl ConditionSet {
    /// Allocate `len` counters, all starting at zero.
    pub fn new(len: usize) -> Self {
        Self {
            counters: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Number of conditions in the set.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// View condition `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn get(&self, i: usize) -> Condition<'_> {
        Condition::from_counter(&self.counters[i])
    }

    /// Reset every counter in the set.
    pub fn reset_all(&self) {
        for counter in self.counters.iter() {
            counter.store(0, Ordering::Release);
        }
    }
}
