//! Aggregated verification report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::engine::Check;
use crate::model::{Board, BoardSummary};
use crate::violation::{CheckId, CheckOutcome, Severity, TruncationNotice, Violation};

/// Outcome of a single check within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckId,
    pub name: String,
    pub severity: Severity,
    /// The check needed an input that was not provided.
    #[serde(default)]
    pub skipped: bool,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<TruncationNotice>,
}

impl CheckResult {
    pub fn from_outcome(check: &dyn Check, outcome: CheckOutcome) -> Self {
        Self {
            check: check.id(),
            name: check.name().to_string(),
            severity: check.severity(),
            skipped: false,
            violations: outcome.violations,
            truncated: outcome.truncated,
        }
    }

    pub fn skipped(check: &dyn Check) -> Self {
        Self {
            check: check.id(),
            name: check.name().to_string(),
            severity: check.severity(),
            skipped: true,
            violations: Vec::new(),
            truncated: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.iter().all(|v| v.severity != Severity::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub file: String,
    pub rules: String,
    pub generated_at: DateTime<Utc>,
    pub summary: BoardSummary,
    pub checks: Vec<CheckResult>,
    pub error_count: usize,
    pub warning_count: usize,
    pub passed: bool,
}

impl Report {
    pub fn new(board: &Board, config: &RuleConfig, checks: Vec<CheckResult>) -> Self {
        let count = |severity: Severity| {
            checks
                .iter()
                .flat_map(|c| c.violations.iter())
                .filter(|v| v.severity == severity)
                .count()
        };
        let error_count = count(Severity::Error);
        let warning_count = count(Severity::Warning);

        Self {
            file: board.filename.clone(),
            rules: config.name.clone(),
            generated_at: Utc::now(),
            summary: board.summary(),
            checks,
            error_count,
            warning_count,
            passed: error_count == 0,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations(Severity::Warning)
    }

    fn violations(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.checks
            .iter()
            .flat_map(|c| c.violations.iter())
            .filter(move |v| v.severity == severity)
    }

    pub fn truncations(&self) -> impl Iterator<Item = &TruncationNotice> {
        self.checks.iter().filter_map(|c| c.truncated.as_ref())
    }

    pub fn check(&self, id: CheckId) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == id)
    }

    /// 0 when no errors were found; warnings never fail a run.
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
