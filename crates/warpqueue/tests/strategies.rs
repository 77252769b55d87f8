//! Integration tests for the queueing strategies.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use warpqueue::prelude::*;

/// Unit that needs `steps` lockstep steps and yields its own index.
struct Countdown {
    index: usize,
    steps: u32,
    done: u32,
}

impl Countdown {
    fn new(index: usize, steps: u32) -> Self {
        Self {
            index,
            steps: steps.max(1),
            done: 0,
        }
    }
}

impl WorkUnit for Countdown {
    type Output = usize;

    fn total_steps(&self) -> Option<u64> {
        Some(self.steps as u64)
    }

    fn step(&mut self) -> Step<usize> {
        self.done += 1;
        if self.done == self.steps {
            Step::Done(self.index)
        } else {
            Step::Continue
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(strategy: QueueStrategy, group_size: usize, num_groups: usize) -> WorkQueueConfig {
    WorkQueueConfigBuilder::new()
        .with_strategy(strategy)
        .with_group_size(group_size)
        .with_num_groups(num_groups)
        .with_launch_capacity(64)
        .with_pass_steps(8)
        .build()
        .expect("valid config")
}

fn random_lengths(seed: u64, len: usize, max: u32) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(1..=max)).collect()
}

fn run(
    strategy: QueueStrategy,
    lengths: &[u32],
    group_size: usize,
    num_groups: usize,
) -> QueueOutput<usize> {
    let source = from_fn(lengths.len(), |i| Countdown::new(i, lengths[i]));
    WorkQueue::new(config(strategy, group_size, num_groups), source)
        .expect("queue construction")
        .process()
        .expect("run to completion")
}

/// Test that every unit completes exactly once under every strategy.
#[test]
fn test_coverage_exactly_once() {
    init_tracing();

    for (seed, len) in [(1u64, 1usize), (2, 31), (3, 32), (4, 500), (5, 1031)] {
        let lengths = random_lengths(seed, len, 50);
        for strategy in QueueStrategy::ALL {
            let output = run(strategy, &lengths, 32, 3);
            assert_eq!(
                output.results,
                (0..len).collect::<Vec<_>>(),
                "{strategy} with {len} units"
            );
            assert_eq!(output.stats.issued_units, len as u64, "{strategy}");
        }
    }
}

/// Test that each source index is fetched exactly once.
#[test]
fn test_no_index_fetched_twice() {
    let lengths = random_lengths(11, 333, 20);
    for strategy in QueueStrategy::ALL {
        let fetched = Mutex::new(Vec::new());
        let source = from_fn(lengths.len(), |i| {
            fetched.lock().push(i);
            Countdown::new(i, lengths[i])
        });
        WorkQueue::new(config(strategy, 8, 4), source)
            .expect("queue construction")
            .process()
            .expect("run to completion");

        let mut fetched = fetched.into_inner();
        fetched.sort_unstable();
        assert_eq!(fetched, (0..333).collect::<Vec<_>>(), "{strategy}");
    }
}

/// Test that an empty source returns immediately with zero stats.
#[test]
fn test_empty_input() {
    for strategy in QueueStrategy::ALL {
        let output = run(strategy, &[], 32, 2);
        assert!(output.results.is_empty());
        assert_eq!(output.launches, 0);
        assert_eq!(
            output.stats,
            WorkQueueStatsSnapshot {
                group_size: 32,
                ..Default::default()
            }
        );
        assert_eq!(output.stats.utilization(), 0.0);
    }
}

/// Test that a single unit reports low but exact utilization.
#[test]
fn test_single_unit() {
    for strategy in QueueStrategy::ALL {
        let output = run(strategy, &[4], 32, 2);
        assert_eq!(output.results, vec![0]);
        assert_eq!(output.stats.iterations, 4, "{strategy}");
        assert_eq!(output.stats.active_lanes, 4, "{strategy}");
        assert!((output.stats.utilization() - 1.0 / 32.0).abs() < 1e-12);
    }
}

/// Test that a partial final group never acquires nonexistent units.
#[test]
fn test_partial_final_group() {
    // 37 units over groups of 8 leave 3 lanes in the last group.
    let lengths = vec![3; 37];
    for strategy in QueueStrategy::ALL {
        let output = run(strategy, &lengths, 8, 2);
        assert_eq!(output.results.len(), 37);
        assert_eq!(output.stats.issued_units, 37, "{strategy}");
        assert_eq!(output.stats.active_lanes, 37 * 3, "{strategy}");
    }
}

/// Test utilization bounds on skewed input.
#[test]
fn test_utilization_in_unit_range() {
    let lengths = random_lengths(21, 800, 200);
    for strategy in QueueStrategy::ALL {
        let stats = run(strategy, &lengths, 32, 4).stats;
        let util = stats.utilization();
        assert!(util > 0.0 && util <= 1.0, "{strategy}: {util}");
        assert_eq!(stats.lane_time(), stats.active_lanes + stats.idle_lane_iterations());
    }
}

/// Test that uniform units in full groups keep every lane busy.
#[test]
fn test_uniform_units_full_utilization() {
    let lengths = vec![5; 128];
    for strategy in QueueStrategy::ALL {
        let stats = run(strategy, &lengths, 16, 1).stats;
        assert_eq!(stats.utilization(), 1.0, "{strategy}: {stats}");
        assert_eq!(stats.iterations, 128 / 16 * 5);
    }
}

/// Test that the ordered queue issues strictly increasing indices.
#[test]
fn test_ordered_monotonic_issuance() {
    let issued = Mutex::new(Vec::new());
    let source = from_fn(200, |i| {
        issued.lock().push(i);
        Countdown::new(i, i as u32 + 1)
    });
    let output = WorkQueue::new(config(QueueStrategy::Ordered, 8, 1), source)
        .expect("queue construction")
        .process()
        .expect("run to completion");

    // 200 units in windows of 64.
    assert_eq!(output.launches, 4);

    let issued = issued.into_inner();
    let mut high_water = None;
    for index in issued {
        assert!(high_water.map_or(true, |max| index > max), "{index} after {high_water:?}");
        high_water = Some(index);
    }
}

/// Test the wasted lockstep cycles of a multi-pass batch with one straggler.
#[test]
fn test_multi_pass_straggler_idle_lanes() {
    const N: usize = 16;
    const LARGE: u32 = 40;

    let mut lengths = vec![1; N];
    lengths[5] = LARGE;

    let config = WorkQueueConfigBuilder::new()
        .with_strategy(QueueStrategy::MultiPass)
        .with_group_size(N)
        .with_num_groups(1)
        .with_pass_steps(64)
        .build()
        .expect("valid config");
    let source = from_fn(N, |i| Countdown::new(i, lengths[i]));
    let output = WorkQueue::new(config, source)
        .expect("queue construction")
        .process()
        .expect("run to completion");

    let stats = output.stats;
    assert_eq!(output.launches, 1);
    assert_eq!(stats.iterations, LARGE as u64);
    assert_eq!(stats.idle_lane_iterations(), (N as u64 - 1) * (LARGE as u64 - 1));
}

/// Test that multi-pass carries unfinished units across passes.
#[test]
fn test_multi_pass_carries_stragglers() {
    let lengths = random_lengths(31, 300, 30);
    let output = run(QueueStrategy::MultiPass, &lengths, 8, 2);
    assert_eq!(output.results, (0..300).collect::<Vec<_>>());
    // Capacity 64, 8 steps per pass: 300 units need more than 300 / 64 passes.
    assert!(output.launches > 5);
}

/// Test that persistent strategies drain the source in a single launch.
#[test]
fn test_persistent_single_launch() {
    let lengths = random_lengths(41, 1000, 64);
    for strategy in [QueueStrategy::PersistentWarps, QueueStrategy::PersistentThreads] {
        assert!(strategy.resolves_on_device());
        let output = run(strategy, &lengths, 32, 4);
        assert_eq!(output.launches, 1, "{strategy}");
    }
}

/// Test that persistent-threads covers the same index set on every run.
#[test]
fn test_persistent_threads_repeatable_coverage() {
    let lengths = random_lengths(51, 700, 25);
    let collect = || -> BTreeSet<usize> {
        run(QueueStrategy::PersistentThreads, &lengths, 16, 6)
            .results
            .into_iter()
            .collect()
    };

    let first = collect();
    let second = collect();
    assert_eq!(first.len(), 700);
    assert_eq!(first, second);
}

/// Test that per-group refill needs fewer cursor claims than per-lane claims.
#[test]
fn test_claim_traffic() {
    let lengths = vec![6u32; 512];
    let mut claims = Vec::new();
    for strategy in [QueueStrategy::PersistentWarps, QueueStrategy::PersistentThreads] {
        let cursor = std::sync::Arc::new(WorkCursor::new());
        let source = from_fn(lengths.len(), |i| Countdown::new(i, lengths[i]));
        WorkQueue::with_cursor(config(strategy, 32, 2), source, cursor.clone())
            .expect("queue construction")
            .process()
            .expect("run to completion");
        assert_eq!(cursor.position(), 512);
        claims.push(cursor.claims());
    }

    assert_eq!(claims[1], 512);
    assert!(claims[0] < claims[1] / 4, "{claims:?}");
}

/// Test that a second run on a finished queue is a no-op.
#[test]
fn test_run_after_completion() {
    for strategy in QueueStrategy::ALL {
        let source = from_fn(90, |i| Countdown::new(i, (i % 4) as u32 + 1));
        let mut queue =
            WorkQueue::new(config(strategy, 8, 2), source).expect("queue construction");

        queue.run().expect("first run");
        let stats = queue.stats();
        let launches = queue.launches();

        let again = queue.run().expect("second run");
        assert_eq!(again.launches, 0);
        assert_eq!(again.stats, stats);
        assert_eq!(queue.launches(), launches);
    }
}

/// Test that the driver aborts when the launch budget runs out.
#[test]
fn test_launch_budget() {
    let config = WorkQueueConfigBuilder::new()
        .with_strategy(QueueStrategy::Ordered)
        .with_group_size(4)
        .with_num_groups(1)
        .with_launch_capacity(10)
        .with_max_launches(2)
        .build()
        .expect("valid config");
    let source = from_fn(100, |i| Countdown::new(i, 1));
    let mut queue = WorkQueue::new(config, source).expect("queue construction");

    let err = queue.run().expect_err("launch budget should abort the run");
    assert_eq!(err, WorkQueueError::LaunchBudgetExceeded { launches: 2 });
    assert_eq!(queue.completed(), 20);
    assert!(matches!(
        queue.into_output().expect_err("unfinished units"),
        WorkQueueError::IncompleteRun { missing: 80 }
    ));
}

/// Test that per-unit failures travel in the output payload.
#[test]
fn test_unit_errors_are_payload() {
    struct Fallible(usize);

    impl WorkUnit for Fallible {
        type Output = std::result::Result<usize, String>;

        fn step(&mut self) -> Step<Self::Output> {
            if self.0 % 10 == 0 {
                Step::Done(Err(format!("unit {} rejected", self.0)))
            } else {
                Step::Done(Ok(self.0 * 2))
            }
        }
    }

    let source = from_fn(50, Fallible);
    let output = WorkQueue::new(config(QueueStrategy::PersistentWarps, 8, 2), source)
        .expect("queue construction")
        .process()
        .expect("run to completion");

    let failures = output.results.iter().filter(|r| r.is_err()).count();
    assert_eq!(failures, 5);
    assert_eq!(output.results[7], Ok(14));
}

/// Unit that panics when it reaches the given index.
struct Volatile {
    index: usize,
    fault_at: usize,
}

impl WorkUnit for Volatile {
    type Output = usize;

    fn step(&mut self) -> Step<usize> {
        if self.index == self.fault_at {
            panic!("unit {} exploded", self.index);
        }
        Step::Done(self.index)
    }
}

/// Test that a panicking unit surfaces as a kernel fault under every strategy.
#[test]
fn test_unit_panic_is_kernel_fault() {
    for strategy in QueueStrategy::ALL {
        let source = from_fn(40, |index| Volatile { index, fault_at: 3 });
        let result = WorkQueue::new(config(strategy, 8, 2), source)
            .expect("queue construction")
            .process();

        match result {
            Err(WorkQueueError::KernelFault(msg)) => {
                assert_eq!(msg, "unit 3 exploded", "{strategy}");
            }
            Err(other) => panic!("{strategy}: unexpected error {other}"),
            Ok(_) => panic!("{strategy}: run succeeded despite a faulted unit"),
        }
    }
}

/// Test that groups starved at the residency barrier leave the work to the
/// groups that made it through, in a single launch.
#[test]
fn test_persistent_warps_starved_groups() {
    const GROUPS: usize = 16;

    let config = WorkQueueConfigBuilder::new()
        .with_strategy(QueueStrategy::PersistentWarps)
        .with_group_size(8)
        .with_num_groups(GROUPS)
        .with_max_condition_iterations(0)
        .build()
        .expect("valid config");
    let lengths = random_lengths(61, 500, 12);
    let source = from_fn(lengths.len(), |i| Countdown::new(i, lengths[i]));
    let mut queue = WorkQueue::new(config, source).expect("queue construction");

    // The last group to arrive always sees the full quota, so a launch can
    // never starve completely.
    let report = queue.launch().expect("persistent launch");
    assert!(report.starved_groups < GROUPS, "{report:?}");
    assert_eq!(report.groups, GROUPS);
    assert!(!queue.work_remaining());

    let again = queue.run().expect("drained queue");
    assert_eq!(again.launches, 0);

    let output = queue.into_output().expect("all units finished");
    assert_eq!(output.launches, 1);
    assert_eq!(output.stats.issued_units, 500);
    assert_eq!(output.results, (0..500).collect::<Vec<_>>());
}
