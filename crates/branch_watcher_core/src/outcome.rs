//! Reconciliation outcomes.
//!
//! Every reconciled branch yields a [`BranchReport`], every repository a
//! [`RepositoryReport`], and a whole run folds into a [`RunSummary`].

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;

/// What happened to a single branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BranchOutcome {
    /// The branch was unprotected and received the policy's default protection.
    AppliedDefaultProtection,
    /// Strict status checks were turned off.
    RelaxedStrictStatusChecks,
    /// The branch was protected and no drift rule matched.
    NoActionNeeded,
    /// Reconciling the branch failed; siblings were not affected.
    Failed { error: String },
}

impl BranchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, BranchOutcome::Failed { .. })
    }

    /// Returns true when a write was issued for the branch.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            BranchOutcome::AppliedDefaultProtection | BranchOutcome::RelaxedStrictStatusChecks
        )
    }
}

/// Outcome of one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branch: String,
    #[serde(flatten)]
    pub outcome: BranchOutcome,
}

impl BranchReport {
    pub fn new(branch: impl Into<String>, outcome: BranchOutcome) -> Self {
        Self {
            branch: branch.into(),
            outcome,
        }
    }
}

/// Outcome of one repository.
///
/// `error` is set when the repository could not be processed at all, e.g. because its
/// branches could not be listed. Branch level failures are recorded in `branches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub repository: String,
    pub branches: Vec<BranchReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepositoryReport {
    pub fn completed(repository: impl Into<String>, branches: Vec<BranchReport>) -> Self {
        Self {
            repository: repository.into(),
            branches,
            error: None,
        }
    }

    pub fn failed(repository: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branches: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Counts over all repositories of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of repositories that were reconciled.
    pub repositories: usize,
    /// Repositories that could not be processed at all.
    pub failed_repositories: usize,
    /// Branches that received default protection.
    pub applied: usize,
    /// Branches whose strict status checks were relaxed.
    pub relaxed: usize,
    /// Branches that needed no change.
    pub unchanged: usize,
    /// Branches that failed.
    pub failed_branches: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[RepositoryReport]) -> Self {
        let mut summary = Self {
            repositories: reports.len(),
            ..Default::default()
        };

        for report in reports {
            if report.is_failure() {
                summary.failed_repositories += 1;
            }
            for branch in &report.branches {
                match branch.outcome {
                    BranchOutcome::AppliedDefaultProtection => summary.applied += 1,
                    BranchOutcome::RelaxedStrictStatusChecks => summary.relaxed += 1,
                    BranchOutcome::NoActionNeeded => summary.unchanged += 1,
                    BranchOutcome::Failed { .. } => summary.failed_branches += 1,
                }
            }
        }

        summary
    }

    /// Returns true if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed_repositories == 0 && self.failed_branches == 0
    }
}
