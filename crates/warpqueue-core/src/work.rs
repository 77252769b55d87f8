//! Work unit and work source contracts.
//!
//! A [`WorkUnit`] is an opaque, variable-cost item of work: the queue only
//! knows how to advance it one step at a time until it reports
//! [`Step::Done`]. A [`WorkSource`] is the finite, indexable stream the queue
//! draws units from; the unit's index in the source is its identity and the
//! key under which its output is returned.

/// Outcome of advancing a work unit by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// The unit needs more steps.
    Continue,
    /// The unit finished and produced its output.
    Done(T),
}

impl<T> Step<T> {
    /// Check whether the unit finished.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }
}

/// A unit of work processed by a single lane.
///
/// Implementations are supplied by the consuming kernel (alignment scoring,
/// seed extension, ...). Failures of the computation itself must be encoded
/// in [`WorkUnit::Output`]; the queue never inspects it.
pub trait WorkUnit: Send {
    /// Per-unit result payload.
    type Output: Send;

    /// Total number of steps, if known. May be computed lazily.
    fn total_steps(&self) -> Option<u64> {
        None
    }

    /// Advance the unit by one step.
    fn step(&mut self) -> Step<Self::Output>;
}

/// Finite, indexable source of work units.
pub trait WorkSource: Sync {
    /// Unit type handed to lanes.
    type Unit: WorkUnit;

    /// Number of units in the source.
    fn len(&self) -> usize;

    /// Check if the source has no units.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the unit at `index`.
    ///
    /// Called exactly once per index over a queue's lifetime.
    fn fetch(&self, index: usize) -> Self::Unit;
}

/// Output type of the units a source yields.
pub type UnitOutput<S> = <<S as WorkSource>::Unit as WorkUnit>::Output;

impl<S: WorkSource + ?Sized> WorkSource for &S {
    type Unit = S::Unit;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn fetch(&self, index: usize) -> Self::Unit {
        (**self).fetch(index)
    }
}

/// Work source backed by a length and a constructor closure.
pub struct SourceFn<F> {
    len: usize,
    make: F,
}

/// Build a [`WorkSource`] from a length and a closure producing unit `i`.
pub fn from_fn<U, F>(len: usize, make: F) -> SourceFn<F>
where
    U: WorkUnit,
    F: Fn(usize) -> U + Sync,
{
    SourceFn { len, make }
}

impl<U, F> WorkSource for SourceFn<F>
where
    U: WorkUnit,
    F: Fn(usize) -> U + Sync,
{
    type Unit = U;

    fn len(&self) -> usize {
        self.len
    }

    fn fetch(&self, index: usize) -> U {
        (self.make)(index)
    }
}

/// A work unit bound to a lane, with its identity and progress.
#[derive(Debug)]
pub struct InFlight<U> {
    /// Index of the unit in its source.
    pub index: usize,
    /// The unit itself.
    pub unit: U,
    /// Steps completed so far.
    pub cursor: u64,
}

impl<U: WorkUnit> InFlight<U> {
    /// Wrap a freshly fetched unit.
    pub fn new(index: usize, unit: U) -> Self {
        Self {
            index,
            unit,
            cursor: 0,
        }
    }

    /// Advance the unit one step, tracking progress.
    pub fn advance(&mut self) -> Step<U::Output> {
        let step = self.unit.step();
        self.cursor += 1;
        step
    }

    /// Steps still expected, when the unit knows its size.
    pub fn remaining_steps(&self) -> Option<u64> {
        self.unit
            .total_steps()
            .map(|total| total.saturating_sub(self.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        left: u32,
    }

    impl WorkUnit for Countdown {
        type Output = &'static str;

        fn total_steps(&self) -> Option<u64> {
            Some(3)
        }

        fn step(&mut self) -> Step<&'static str> {
            self.left -= 1;
            if self.left == 0 {
                Step::Done("done")
            } else {
                Step::Continue
            }
        }
    }

    #[test]
    fn test_in_flight_progress() {
        let mut unit = InFlight::new(4, Countdown { left: 3 });
        assert_eq!(unit.remaining_steps(), Some(3));

        assert_eq!(unit.advance(), Step::Continue);
        assert_eq!(unit.advance(), Step::Continue);
        assert_eq!(unit.remaining_steps(), Some(1));
        assert!(unit.advance().is_done());
        assert_eq!(unit.cursor, 3);
        assert_eq!(unit.index, 4);
    }

    #[test]
    fn test_source_fn() {
        let source = from_fn(10, |i| Countdown { left: i as u32 + 1 });
        assert_eq!(source.len(), 10);
        assert!(!source.is_empty());

        let mut unit = source.fetch(0);
        assert!(unit.step().is_done());

        let by_ref = &source;
        assert_eq!(WorkSource::len(&by_ref), 10);
    }
}
