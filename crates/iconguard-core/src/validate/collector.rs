//! Issue accumulation with check accounting.

use crate::models::{Issue, Severity, Summary, ValidationResult};

/// Records every rule evaluation, keeping the issue for each failed one.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<Issue>,
    checks_total: usize,
    checks_passed: usize,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one check; `failure` is only built when the check fails.
    pub fn check(&mut self, passed: bool, failure: impl FnOnce() -> Issue) {
        self.checks_total += 1;
        if passed {
            self.checks_passed += 1;
        } else {
            self.issues.push(failure());
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    /// Score as `100 - 20*critical - 10*warning`.
    pub fn into_geometry_result(self) -> ValidationResult {
        let summary = Summary::from_issues(&self.issues);
        let score = geometry_score(&summary);
        self.finish(summary, score)
    }

    /// Score as `100*passed/total - 20*critical - 5*warning`.
    pub fn into_compliance_result(self) -> ValidationResult {
        let summary = Summary::from_issues(&self.issues);
        let score = compliance_score(&summary, self.checks_passed, self.checks_total);
        self.finish(summary, score)
    }

    fn finish(self, summary: Summary, score: f64) -> ValidationResult {
        ValidationResult {
            is_valid: summary.critical == 0,
            issues: self.issues,
            summary,
            score,
            checks_passed: self.checks_passed,
            checks_total: self.checks_total,
        }
    }
}

pub fn geometry_score(summary: &Summary) -> f64 {
    let penalty = 20.0 * summary.critical as f64 + 10.0 * summary.warnings as f64;
    (100.0 - penalty).max(0.0)
}

pub fn compliance_score(summary: &Summary, checks_passed: usize, checks_total: usize) -> f64 {
    let ratio = if checks_total == 0 {
        1.0
    } else {
        checks_passed as f64 / checks_total as f64
    };
    let penalty = 20.0 * summary.critical as f64 + 5.0 * summary.warnings as f64;
    (100.0 * ratio - penalty).max(0.0)
}
