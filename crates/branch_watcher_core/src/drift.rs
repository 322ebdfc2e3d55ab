//! Drift rules.
//!
//! A drift rule inspects the observed protection of a protected branch and names the
//! correction to apply, if any. Rules are evaluated in order and the first match wins.

use config_manager::definitions::DEVELOP_BRANCH;
use github_client::ProtectionState;
use std::fmt::Debug;

/// A corrective action for a protected branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Turn off the "require branches to be up to date" flag of the status checks.
    RelaxStrictStatusChecks,
}

/// Detects one kind of drift between the observed and the desired protection.
pub trait DriftRule: Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn evaluate(&self, branch: &str, state: &ProtectionState) -> Option<Correction>;
}

/// Relaxes strict status checks on one branch.
///
/// Strict checks get propagated to `develop` from organization defaults and force every
/// pull request to be rebased before merging; policy wants them off there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictStatusChecksRule {
    branch: String,
}

impl StrictStatusChecksRule {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl DriftRule for StrictStatusChecksRule {
    fn name(&self) -> &str {
        "strict-status-checks"
    }

    fn evaluate(&self, branch: &str, state: &ProtectionState) -> Option<Correction> {
        (branch == self.branch && state.has_strict_status_checks())
            .then_some(Correction::RelaxStrictStatusChecks)
    }
}

/// The rules applied by default: relax strict status checks on `develop`.
pub fn default_rules() -> Vec<Box<dyn DriftRule>> {
    vec![Box::new(StrictStatusChecksRule::new(DEVELOP_BRANCH))]
}
