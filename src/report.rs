use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::trial::{TrialKind, TrialResult, Verdict};

/// Classification of the plain-counter evidence across all repeats.
///
/// `Inconclusive` means the race never reproduced on this host; it is
/// reported as such, never silently folded into a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlainVerdict {
    Demonstrated,
    Inconclusive,
}

/// Aggregate of all repeats of one trial kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    pub kind: TrialKind,
    pub repeats: usize,
    pub expected: u64,
    pub observed_min: u64,
    pub observed_max: u64,
    pub violations: usize,
    /// Repeats where the observed value fell short of the expected one.
    pub diverged_repeats: usize,
    pub total_time: Duration,
}

impl TrialReport {
    pub fn from_results(kind: TrialKind, results: &[TrialResult]) -> Self {
        let observed_min = results.iter().map(|r| r.observed).min().unwrap_or(0);
        let observed_max = results.iter().map(|r| r.observed).max().unwrap_or(0);
        let violations = results
            .iter()
            .filter(|r| r.verdict == Verdict::Inconsistent)
            .count();
        let diverged_repeats = results.iter().filter(|r| r.lost_updates() > 0).count();
        TrialReport {
            kind,
            repeats: results.len(),
            expected: results.first().map(|r| r.expected).unwrap_or(0),
            observed_min,
            observed_max,
            violations,
            diverged_repeats,
            total_time: results.iter().map(|r| r.elapsed).sum(),
        }
    }

    /// Only meaningful for the plain kind; other kinds have hard verdicts.
    pub fn plain_verdict(&self) -> Option<PlainVerdict> {
        if self.kind != TrialKind::Plain {
            return None;
        }
        if self.diverged_repeats > 0 {
            Some(PlainVerdict::Demonstrated)
        } else {
            Some(PlainVerdict::Inconclusive)
        }
    }
}

/// The full harness run: one `TrialReport` per selected kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessReport {
    pub reports: Vec<TrialReport>,
}

impl HarnessReport {
    pub fn has_violation(&self) -> bool {
        self.reports.iter().any(|r| r.violations > 0)
    }

    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize harness report")?;
        std::fs::write(file_path, json)
            .with_context(|| format!("Failed to write report to {:?}", file_path))?;
        Ok(())
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} {:>7} {:>12} {:>12} {:>12} {:>10}",
            self.kind.to_string(),
            self.repeats,
            self.expected,
            self.observed_min,
            self.observed_max,
            self.violations,
        )
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>7} {:>12} {:>12} {:>12} {:>10}",
            "configuration", "repeats", "expected", "observed-min", "observed-max", "violations",
        )?;
        for report in &self.reports {
            writeln!(f, "{}", report)?;
        }
        for report in &self.reports {
            match report.plain_verdict() {
                Some(PlainVerdict::Demonstrated) => {
                    writeln!(
                        f,
                        "plain: lost updates in {}/{} repeats (race demonstrated)",
                        report.diverged_repeats, report.repeats,
                    )?;
                }
                Some(PlainVerdict::Inconclusive) => {
                    writeln!(
                        f,
                        "plain: no divergence observed in {} repeats (inconclusive, not a pass)",
                        report.repeats,
                    )?;
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(kind: TrialKind, expected: u64, observed: u64) -> TrialResult {
        let verdict = if kind.asserts_invariant() && observed != expected {
            Verdict::Inconsistent
        } else {
            Verdict::Consistent
        };
        TrialResult {
            kind,
            expected,
            observed,
            consumer_observations: Vec::new(),
            verdict,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn aggregates_min_max_and_violations() {
        let results = vec![
            result(TrialKind::Atomic, 400_000, 400_000),
            result(TrialKind::Atomic, 400_000, 399_999),
            result(TrialKind::Atomic, 400_000, 400_000),
        ];
        let report = TrialReport::from_results(TrialKind::Atomic, &results);
        assert_eq!(report.observed_min, 399_999);
        assert_eq!(report.observed_max, 400_000);
        assert_eq!(report.violations, 1);
    }

    #[test]
    fn plain_divergence_is_data_not_violation() {
        let results = vec![
            result(TrialKind::Plain, 2_000_000, 1_400_000),
            result(TrialKind::Plain, 2_000_000, 2_000_000),
        ];
        let report = TrialReport::from_results(TrialKind::Plain, &results);
        assert_eq!(report.violations, 0);
        assert_eq!(report.diverged_repeats, 1);
        assert_eq!(report.plain_verdict(), Some(PlainVerdict::Demonstrated));
    }

    #[test]
    fn plain_without_divergence_is_inconclusive() {
        let results = vec![result(TrialKind::Plain, 1_000, 1_000)];
        let report = TrialReport::from_results(TrialKind::Plain, &results);
        assert_eq!(report.plain_verdict(), Some(PlainVerdict::Inconclusive));
    }

    #[test]
    fn non_plain_kinds_have_no_plain_verdict() {
        let results = vec![result(TrialKind::Mutex, 100, 100)];
        let report = TrialReport::from_results(TrialKind::Mutex, &results);
        assert_eq!(report.plain_verdict(), None);
    }

    #[test]
    fn summary_table_carries_the_expected_columns() {
        let harness = HarnessReport {
            reports: vec![TrialReport::from_results(
                TrialKind::Atomic,
                &[result(TrialKind::Atomic, 400_000, 400_000)],
            )],
        };
        let rendered = harness.to_string();
        assert!(rendered.contains("configuration"));
        assert!(rendered.contains("observed-min"));
        assert!(rendered.contains("atomic"));
        assert!(!harness.has_violation());
    }
}
