//! Trial kinds and per-trial results.

pub mod counter;
pub mod publish;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::HarnessError;

/// The memory-access discipline a trial exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    /// Unsynchronized split load/store read-modify-write on a shared counter.
    Plain,
    /// Release-store publication flag, acquire-load consumer spin.
    Flagged,
    /// Atomic fetch-and-add counter.
    Atomic,
    /// Mutex-guarded counter, the locking contrast to `Atomic`.
    Mutex,
}

impl TrialKind {
    pub const ALL: [TrialKind; 4] = [
        TrialKind::Plain,
        TrialKind::Flagged,
        TrialKind::Atomic,
        TrialKind::Mutex,
    ];

    /// Whether the kind asserts a strict final-value invariant.
    pub fn asserts_invariant(self) -> bool {
        !matches!(self, TrialKind::Plain)
    }
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrialKind::Plain => "plain",
            TrialKind::Flagged => "flagged",
            TrialKind::Atomic => "atomic",
            TrialKind::Mutex => "mutex",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Consistent,
    Inconsistent,
}

/// Outcome of one trial run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub kind: TrialKind,
    pub expected: u64,
    pub observed: u64,
    /// Per-consumer payload reads; empty for counter trials.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub consumer_observations: Vec<u64>,
    pub verdict: Verdict,
    pub elapsed: Duration,
}

impl TrialResult {
    /// Increments that never made it into the final value. Only the plain
    /// kind is expected to report a non-zero count.
    pub fn lost_updates(&self) -> u64 {
        self.expected.saturating_sub(self.observed)
    }

    /// Turns an `Inconsistent` verdict into a hard error. Plain trials
    /// assert no invariant and always pass this check.
    pub fn check(&self) -> Result<(), HarnessError> {
        match self.verdict {
            Verdict::Consistent => Ok(()),
            Verdict::Inconsistent => Err(HarnessError::InvariantViolation {
                kind: self.kind,
                expected: self.expected,
                observed: self.observed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_kind_asserts_nothing() {
        assert!(!TrialKind::Plain.asserts_invariant());
        assert!(TrialKind::Atomic.asserts_invariant());
        assert!(TrialKind::Flagged.asserts_invariant());
        assert!(TrialKind::Mutex.asserts_invariant());
    }

    #[test]
    fn check_rejects_inconsistent_result() {
        let result = TrialResult {
            kind: TrialKind::Atomic,
            expected: 100,
            observed: 97,
            consumer_observations: Vec::new(),
            verdict: Verdict::Inconsistent,
            elapsed: Duration::ZERO,
        };
        assert!(result.check().is_err());
        assert_eq!(result.lost_updates(), 3);
    }
}
