use thiserror::Error;

use crate::trial::TrialKind;

/// Errors surfaced by the harness.
///
/// An `InvariantViolation` is fatal to the exit status and is never
/// retried: it means a synchronization primitive failed to provide its
/// guarantee, and retrying would mask the bug.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("{kind} trial invariant violated: expected {expected}, observed {observed}")]
    InvariantViolation {
        kind: TrialKind,
        expected: u64,
        observed: u64,
    },
}
