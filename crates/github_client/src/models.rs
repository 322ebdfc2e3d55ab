//! # Models
//!
//! Listing models returned by the GitHub API. Only the fields the watcher needs are
//! decoded; every other field in the payload is ignored so that additions to the API do
//! not break decoding.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// A repository as returned by the organization repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositorySummary {
    /// Repository name, unique within its organization.
    pub name: String,
    /// Whether the repository is archived. Missing means not archived.
    #[serde(default)]
    pub archived: bool,
}

/// Protection flag embedded in a branch listing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchProtectionFlag {
    #[serde(default)]
    pub enabled: bool,
}

/// A branch as returned by the repository branch listing.
///
/// GitHub reports protection both as a top-level `protected` flag and as
/// `protection.enabled`. The nested flag wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchSummary {
    pub name: String,
    #[serde(default)]
    pub protected: Option<bool>,
    #[serde(default)]
    pub protection: Option<BranchProtectionFlag>,
}

impl BranchSummary {
    /// Creates a branch summary with the given protection flag.
    pub fn new(name: impl Into<String>, protection_enabled: bool) -> Self {
        Self {
            name: name.into(),
            protected: Some(protection_enabled),
            protection: Some(BranchProtectionFlag {
                enabled: protection_enabled,
            }),
        }
    }

    /// Returns true when the branch currently has protection enabled.
    pub fn protection_enabled(&self) -> bool {
        match (&self.protection, self.protected) {
            (Some(flag), _) => flag.enabled,
            (None, Some(protected)) => protected,
            (None, None) => false,
        }
    }
}
