//! Work units shared by the unit tests.

use warpqueue_core::work::{Step, WorkUnit};

/// Unit that finishes after a fixed number of steps and yields its index.
#[derive(Debug, Clone)]
pub(crate) struct Fixed {
    index: usize,
    steps: u64,
    done: u64,
}

impl Fixed {
    pub(crate) fn new(index: usize, steps: u64) -> Self {
        Self {
            index,
            steps: steps.max(1),
            done: 0,
        }
    }
}

impl WorkUnit for Fixed {
    type Output = usize;

    fn total_steps(&self) -> Option<u64> {
        Some(self.steps)
    }

    fn step(&mut self) -> Step<usize> {
        self.done += 1;
        if self.done >= self.steps {
            Step::Done(self.index)
        } else {
            Step::Continue
        }
    }
}
