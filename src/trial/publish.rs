//! Publish/subscribe trial: release-store publication, acquire-load spin.
//!
//! One producer writes the payload and then raises a flag with a
//! release-store. Consumers spin on the flag with acquire-loads; once a
//! consumer sees the flag raised, every write that preceded the release
//! in the producer's program order must be visible to it, so the payload
//! read can never be stale or partial.

use std::sync::atomic::{
    AtomicBool, AtomicU64,
    Ordering::{Acquire, Relaxed, Release},
};
use std::thread;
use std::time::Instant;

use log::debug;

use super::{TrialKind, TrialResult, Verdict};
use crate::errors::HarnessError;

/// Payload the CLI publishes by default.
pub const DEFAULT_PAYLOAD: u64 = 42;

/// Runs one publication round with `consumers` spinning readers.
///
/// `spin_budget` bounds the tight spin: after that many relaxed polls a
/// consumer yields the processor before polling again, so the spin has an
/// explicit suspension point and cannot starve the producer.
pub fn run_publish_subscribe_trial(
    consumers: usize,
    payload: u64,
    spin_budget: u32,
) -> Result<TrialResult, HarnessError> {
    if consumers == 0 {
        return Err(HarnessError::Configuration(
            "consumer count must be at least 1".to_string(),
        ));
    }
    if spin_budget == 0 {
        return Err(HarnessError::Configuration(
            "spin budget must be at least 1".to_string(),
        ));
    }

    let slot = AtomicU64::new(0);
    let ready = AtomicBool::new(false);

    let start = Instant::now();
    let observations = thread::scope(|s| {
        let handles: Vec<_> = (0..consumers)
            .map(|_| s.spawn(|| spin_until_published(&ready, &slot, spin_budget)))
            .collect();

        s.spawn(|| {
            slot.store(payload, Relaxed);
            // Publishes the payload write above to any consumer whose
            // acquire-load sees this flag as true.
            ready.store(true, Release);
        });

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(value) => value,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<u64>>()
    });
    let elapsed = start.elapsed();

    let observed = observations
        .iter()
        .copied()
        .find(|&value| value != payload)
        .unwrap_or(payload);
    let verdict = if observed == payload {
        Verdict::Consistent
    } else {
        Verdict::Inconsistent
    };
    debug!(
        "flagged trial: payload {payload}, {} consumers, verdict {verdict:?} in {elapsed:?}",
        observations.len()
    );

    Ok(TrialResult {
        kind: TrialKind::Flagged,
        expected: payload,
        observed,
        consumer_observations: observations,
        verdict,
        elapsed,
    })
}

fn spin_until_published(ready: &AtomicBool, slot: &AtomicU64, spin_budget: u32) -> u64 {
    let mut polls = 0u32;
    while !ready.load(Acquire) {
        // The spin is unbounded by design, so the poll counter must not
        // panic on overflow; wrapping keeps the yield cadence intact.
        polls = polls.wrapping_add(1);
        if polls % spin_budget == 0 {
            thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
    }
    // The acquire above synchronizes with the producer's release, so this
    // relaxed read observes the full payload.
    slot.load(Relaxed)
}
