//! Shared work cursor.
//!
//! The cursor is the single global issue counter every strategy draws unit
//! indices from. Claims are linearizable: each index below the limit is handed
//! out exactly once, in increasing order of claim.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Global atomic issue counter shared by all lanes of a queue.
#[derive(Debug, Default)]
pub struct WorkCursor {
    /// Next unissued unit index.
    next: AtomicUsize,
    /// Successful claim operations.
    claims: AtomicU64,
}

impl WorkCursor {
    /// Create a cursor at index zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unissued index.
    #[inline]
    pub fn position(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    /// Check whether every index below `limit` has been issued.
    #[inline]
    pub fn is_exhausted(&self, limit: usize) -> bool {
        self.position() >= limit
    }

    /// Claim up to `count` consecutive indices below `limit`.
    ///
    /// A bounded fetch-and-add: the cursor never moves past `limit`, so a
    /// claim against an exhausted range returns `None` instead of an index
    /// that does not exist.
    pub fn claim(&self, count: usize, limit: usize) -> Option<Range<usize>> {
        if count == 0 {
            return None;
        }
        let start = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (next < limit).then(|| next + count.min(limit - next))
            })
            .ok()?;
        self.claims.fetch_add(1, Ordering::Relaxed);
        Some(start..start + count.min(limit - start))
    }

    /// Claim a single index below `limit`.
    #[inline]
    pub fn claim_one(&self, limit: usize) -> Option<usize> {
        self.claim(1, limit).map(|range| range.start)
    }

    /// Number of successful claim operations so far.
    pub fn claims(&self) -> u64 {
        self.claims.load(Ordering::Relaxed)
    }
}
