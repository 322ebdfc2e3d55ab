//! Environment variable access.
//!
//! The policy is configured entirely through environment variables. Reading goes through
//! the [`VariableSource`] trait so that the policy can be built from a map in tests.

use std::collections::HashMap;

use crate::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;

/// Name of the organization whose repositories are watched.
pub const ORGANIZATION_NAME: &str = "GH_ORGANIZATION_NAME";
/// Access token used to authenticate against the GitHub API.
pub const ACCESS_TOKEN: &str = "GH_ACCESS_TOKEN";
/// Comma separated repositories that are never touched.
pub const REPOSITORIES_IGNORE: &str = "GH_REPOSITORIES_IGNORE";
/// Comma separated status check contexts required on `develop`.
pub const DEVELOP_REQUIRED_STATUS_CHECKS: &str = "GH_DEVELOP_REQUIRED_STATUS_CHECKS";
/// Comma separated users allowed to push to `master`.
pub const MASTER_RESTRICT_TO_USERS: &str = "GH_MASTER_RESTRICT_TO_USERS";
/// Comma separated teams allowed to push to `master`.
pub const MASTER_RESTRICT_TO_TEAMS: &str = "GH_MASTER_RESTRICT_TO_TEAMS";
/// Comma separated team ids that should have write access to every repository.
pub const WRITE_PERMISSION_TEAM_IDS: &str = "GH_REPOSITORIES_ADD_WRITE_PERMISSION_TO_TEAM_IDS";
/// Root of the GitHub REST API.
pub const API_BASE_URL: &str = "GH_API_BASE_URL";
/// `Accept` header sent with every API request.
pub const API_ACCEPT: &str = "GH_API_ACCEPT";
/// Maximum number of pages followed for a single listing.
pub const API_MAX_PAGES: &str = "GH_API_MAX_PAGES";

/// A source of configuration variables.
pub trait VariableSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl VariableSource for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VariableSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl VariableSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|value| value.to_string())
    }
}

/// Returns the value of a required variable.
///
/// # Errors
///
/// Returns `ConfigurationError::RequiredConfigMissing` when the variable is unset or blank.
pub fn required(source: &impl VariableSource, key: &str) -> ConfigurationResult<String> {
    optional(source, key).ok_or_else(|| ConfigurationError::RequiredConfigMissing {
        key: key.to_string(),
    })
}

/// Returns the value of an optional variable, treating blank values as unset.
pub fn optional(source: &impl VariableSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Splits a comma separated variable into trimmed values.
///
/// An unset or blank variable yields an empty list.
pub fn comma_separated(source: &impl VariableSource, key: &str) -> Vec<String> {
    match optional(source, key) {
        Some(values) => values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}
