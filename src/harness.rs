//! Drives repeated trials and aggregates their results.

use log::{debug, info, warn};

use crate::errors::HarnessError;
use crate::report::{HarnessReport, TrialReport};
use crate::trial::{TrialKind, TrialResult, counter, publish};

/// Fully resolved and validated workload for one harness run.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub workers: usize,
    pub increments: u64,
    pub repeats: usize,
    pub kinds: Vec<TrialKind>,
    pub payload: u64,
    pub spin_budget: u32,
}

pub struct Harness {
    plan: TrialPlan,
}

impl Harness {
    pub fn new(plan: TrialPlan) -> Self {
        Self { plan }
    }

    /// Runs every selected kind for the planned number of repeats.
    ///
    /// Invariant violations do not abort the run: each one is logged and
    /// counted so the summary covers all repeats, and the caller turns
    /// the counts into the exit status.
    pub fn run(&self) -> Result<HarnessReport, HarnessError> {
        let mut reports = Vec::with_capacity(self.plan.kinds.len());
        for &kind in &self.plan.kinds {
            info!(
                "running {} x {kind} trials ({} workers, {} increments)",
                self.plan.repeats, self.plan.workers, self.plan.increments,
            );
            let mut results = Vec::with_capacity(self.plan.repeats);
            for repeat in 0..self.plan.repeats {
                let result = self.run_one(kind)?;
                if let Err(violation) = result.check() {
                    warn!("repeat {repeat}: {violation}");
                }
                debug!(
                    "repeat {repeat}: {kind} observed {} of {}",
                    result.observed, result.expected,
                );
                results.push(result);
            }
            reports.push(TrialReport::from_results(kind, &results));
        }
        Ok(HarnessReport { reports })
    }

    fn run_one(&self, kind: TrialKind) -> Result<TrialResult, HarnessError> {
        match kind {
            TrialKind::Plain => {
                counter::run_plain_counter_trial(self.plan.workers, self.plan.increments)
            }
            TrialKind::Atomic => {
                counter::run_atomic_counter_trial(self.plan.workers, self.plan.increments)
            }
            TrialKind::Mutex => {
                counter::run_mutex_counter_trial(self.plan.workers, self.plan.increments)
            }
            TrialKind::Flagged => publish::run_publish_subscribe_trial(
                self.plan.workers,
                self.plan.payload,
                self.plan.spin_budget,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_plan(kinds: Vec<TrialKind>) -> TrialPlan {
        TrialPlan {
            workers: 2,
            increments: 1_000,
            repeats: 3,
            kinds,
            payload: 42,
            spin_budget: 64,
        }
    }

    #[test]
    fn runs_one_report_per_kind() {
        let harness = Harness::new(small_plan(TrialKind::ALL.to_vec()));
        let report = harness.run().unwrap();
        assert_eq!(report.reports.len(), 4);
        for trial_report in &report.reports {
            assert_eq!(trial_report.repeats, 3);
        }
    }

    #[test]
    fn synchronized_kinds_never_violate() {
        let harness = Harness::new(small_plan(vec![
            TrialKind::Atomic,
            TrialKind::Mutex,
            TrialKind::Flagged,
        ]));
        let report = harness.run().unwrap();
        assert!(!report.has_violation());
    }
}
