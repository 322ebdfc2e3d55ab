//! Default branch protection definitions.
//!
//! Two branches are governed by policy:
//!
//! - `develop` requires strict status checks for the configured contexts and pull request
//!   reviews without stale review dismissal.
//! - `master` restricts pushes to the configured users and teams.

use github_client::{
    DismissalRestrictions, ProtectionDefinition, PullRequestReviewsDefinition,
    RestrictionsDefinition, StatusChecksDefinition,
};
use std::collections::BTreeMap;

use crate::environment::{
    comma_separated, VariableSource, DEVELOP_REQUIRED_STATUS_CHECKS, MASTER_RESTRICT_TO_TEAMS,
    MASTER_RESTRICT_TO_USERS,
};

pub const DEVELOP_BRANCH: &str = "develop";
pub const MASTER_BRANCH: &str = "master";

/// Protection for `develop`: strict status checks plus pull request reviews.
pub fn develop_protection(required_contexts: Vec<String>) -> ProtectionDefinition {
    ProtectionDefinition {
        required_status_checks: Some(StatusChecksDefinition {
            strict: true,
            contexts: required_contexts,
        }),
        required_pull_request_reviews: Some(PullRequestReviewsDefinition {
            dismissal_restrictions: DismissalRestrictions::Disabled {},
            dismiss_stale_reviews: false,
        }),
        enforce_admins: false,
        restrictions: None,
    }
}

/// Protection for `master`: pushes restricted to the given users and teams.
pub fn master_protection(users: Vec<String>, teams: Vec<String>) -> ProtectionDefinition {
    ProtectionDefinition {
        required_status_checks: None,
        required_pull_request_reviews: None,
        enforce_admins: false,
        restrictions: Some(RestrictionsDefinition { users, teams }),
    }
}

/// Builds the protection definitions keyed by branch name from the given source.
pub fn default_definitions(source: &impl VariableSource) -> BTreeMap<String, ProtectionDefinition> {
    BTreeMap::from([
        (
            DEVELOP_BRANCH.to_string(),
            develop_protection(comma_separated(source, DEVELOP_REQUIRED_STATUS_CHECKS)),
        ),
        (
            MASTER_BRANCH.to_string(),
            master_protection(
                comma_separated(source, MASTER_RESTRICT_TO_USERS),
                comma_separated(source, MASTER_RESTRICT_TO_TEAMS),
            ),
        ),
    ])
}
