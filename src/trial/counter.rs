//! Shared-counter trials: plain, atomic, and mutex disciplines.
//!
//! Every worker performs the same fixed workload of increments; the
//! disciplines differ only in the primitive mediating the shared counter.
//! The harness owns the counter and lends it to workers through scoped
//! threads, so no worker outlives the trial.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::thread;
use std::time::Instant;

use log::debug;
use rand::Rng;

use super::{TrialKind, TrialResult, Verdict};
use crate::errors::HarnessError;

/// Unsynchronized trial. Each increment is a relaxed load followed by a
/// relaxed store, so the read-modify-write sequence is not atomic and
/// concurrent workers overwrite each other's updates. No final-value
/// guarantee is asserted; the observed drift is the data.
pub fn run_plain_counter_trial(
    workers: usize,
    increments: u64,
) -> Result<TrialResult, HarnessError> {
    run_counter_trial(TrialKind::Plain, workers, increments)
}

/// Atomic trial. Increments go through `fetch_add`, so the final value
/// must equal `workers * increments` on every run.
pub fn run_atomic_counter_trial(
    workers: usize,
    increments: u64,
) -> Result<TrialResult, HarnessError> {
    run_counter_trial(TrialKind::Atomic, workers, increments)
}

/// Mutex trial. Same invariant as the atomic trial, enforced by mutual
/// exclusion instead of a lock-free primitive.
pub fn run_mutex_counter_trial(
    workers: usize,
    increments: u64,
) -> Result<TrialResult, HarnessError> {
    run_counter_trial(TrialKind::Mutex, workers, increments)
}

fn run_counter_trial(
    kind: TrialKind,
    workers: usize,
    increments: u64,
) -> Result<TrialResult, HarnessError> {
    if workers == 0 {
        return Err(HarnessError::Configuration(
            "worker count must be at least 1".to_string(),
        ));
    }
    let expected = (workers as u64).checked_mul(increments).ok_or_else(|| {
        HarnessError::Configuration(format!(
            "workload {workers} x {increments} overflows the counter"
        ))
    })?;

    let start = Instant::now();
    let observed = match kind {
        TrialKind::Plain => race_counter(workers, increments, plain_worker),
        TrialKind::Atomic => race_counter(workers, increments, atomic_worker),
        TrialKind::Mutex => run_mutex_workers(workers, increments),
        TrialKind::Flagged => {
            return Err(HarnessError::Configuration(
                "flagged is a publication trial, not a counter trial".to_string(),
            ));
        }
    };
    let elapsed = start.elapsed();

    // The plain kind asserts no invariant; its divergence is measured,
    // not judged.
    let verdict = if kind.asserts_invariant() && observed != expected {
        Verdict::Inconsistent
    } else {
        Verdict::Consistent
    };
    debug!("{kind} trial: expected {expected}, observed {observed} in {elapsed:?}");

    Ok(TrialResult {
        kind,
        expected,
        observed,
        consumer_observations: Vec::new(),
        verdict,
        elapsed,
    })
}

fn race_counter(workers: usize, increments: u64, worker: fn(&AtomicU64, u64)) -> u64 {
    let counter = AtomicU64::new(0);
    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| worker(&counter, increments));
        }
    });
    counter.load(Relaxed)
}

fn plain_worker(counter: &AtomicU64, increments: u64) {
    let mut rng = rand::rng();
    for _ in 0..increments {
        let current = counter.load(Relaxed);
        // Widen the window between read and write so interleavings with
        // other workers actually happen on fast hardware.
        if current & 0x3f == 0 {
            for _ in 0..rng.random_range(1..16u32) {
                std::hint::spin_loop();
            }
        }
        counter.store(current + 1, Relaxed);
    }
}

fn atomic_worker(counter: &AtomicU64, increments: u64) {
    for _ in 0..increments {
        counter.fetch_add(1, Relaxed);
    }
}

fn run_mutex_workers(workers: usize, increments: u64) -> u64 {
    let counter = Mutex::new(0u64);
    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| {
                for _ in 0..increments {
                    let mut guard = counter.lock().expect("counter mutex poisoned");
                    *guard += 1;
                }
            });
        }
    });
    counter.into_inner().expect("counter mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_counter_is_exact() {
        let result = run_atomic_counter_trial(4, 10_000).unwrap();
        assert_eq!(result.observed, 40_000);
        assert_eq!(result.verdict, Verdict::Consistent);
        assert!(result.check().is_ok());
    }

    #[test]
    fn mutex_counter_is_exact() {
        let result = run_mutex_counter_trial(3, 5_000).unwrap();
        assert_eq!(result.observed, 15_000);
        assert!(result.check().is_ok());
    }

    #[test]
    fn zero_increments_is_a_valid_workload() {
        let result = run_atomic_counter_trial(8, 0).unwrap();
        assert_eq!(result.expected, 0);
        assert_eq!(result.observed, 0);
    }

    #[test]
    fn plain_counter_never_overshoots() {
        let result = run_plain_counter_trial(2, 50_000).unwrap();
        assert!(result.observed <= result.expected);
        // Structurally the plain trial always completes consistent.
        assert!(result.check().is_ok());
    }

    #[test]
    fn single_worker_plain_counter_is_exact() {
        // With one worker there is nothing to race against.
        let result = run_plain_counter_trial(1, 10_000).unwrap();
        assert_eq!(result.observed, 10_000);
        assert_eq!(result.lost_updates(), 0);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = run_atomic_counter_trial(0, 100).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn overflowing_workload_is_rejected() {
        let err = run_atomic_counter_trial(2, u64::MAX).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }
}
