//! The branch protection policy.
//!
//! A [`PolicyStore`] is built once per process and shared read-only by the reconciliation
//! engine. It holds the organization, the repositories to leave alone, the desired
//! protection per branch and the API connection options.

use github_client::ProtectionDefinition;
use secrecy::SecretString;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use url::Url;

use crate::definitions::default_definitions;
use crate::environment::{
    comma_separated, optional, required, ProcessEnvironment, VariableSource, ACCESS_TOKEN,
    API_ACCEPT, API_BASE_URL, API_MAX_PAGES, ORGANIZATION_NAME, REPOSITORIES_IGNORE,
    WRITE_PERMISSION_TEAM_IDS,
};
use crate::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// Connection options shared by every GitHub API request.
#[derive(Debug)]
pub struct ApiConnection {
    /// Root of the REST API, e.g. `https://api.github.com`.
    pub base_url: String,
    /// `Accept` header value.
    pub accept: String,
    /// Bearer token.
    pub token: SecretString,
    /// Maximum number of pages followed for a single listing.
    pub max_pages: usize,
}

impl ApiConnection {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.github.com";
    pub const DEFAULT_ACCEPT: &'static str = "application/vnd.github+json";
    pub const DEFAULT_MAX_PAGES: usize = 1000;

    /// Creates connection options for api.github.com with the given token.
    pub fn new(token: SecretString) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            accept: Self::DEFAULT_ACCEPT.to_string(),
            token,
            max_pages: Self::DEFAULT_MAX_PAGES,
        }
    }

    fn from_source(source: &impl VariableSource) -> ConfigurationResult<Self> {
        let token = SecretString::from(required(source, ACCESS_TOKEN)?);

        let base_url = optional(source, API_BASE_URL)
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|e| ConfigurationError::InvalidConfiguration {
            field: API_BASE_URL.to_string(),
            reason: format!("'{}' is not a valid URL: {}", base_url, e),
        })?;

        let accept =
            optional(source, API_ACCEPT).unwrap_or_else(|| Self::DEFAULT_ACCEPT.to_string());

        let max_pages = match optional(source, API_MAX_PAGES) {
            Some(value) => match value.parse::<usize>() {
                Ok(pages) if pages > 0 => pages,
                _ => {
                    return Err(ConfigurationError::InvalidConfiguration {
                        field: API_MAX_PAGES.to_string(),
                        reason: format!("'{}' is not a positive integer", value),
                    })
                }
            },
            None => Self::DEFAULT_MAX_PAGES,
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            accept,
            token,
            max_pages,
        })
    }
}

/// The declarative branch protection policy.
///
/// # Examples
///
/// ```rust
/// use config_manager::{definitions, ApiConnection, PolicyStore};
/// use secrecy::SecretString;
/// use std::collections::BTreeMap;
///
/// let policy = PolicyStore::new(
///     "acme",
///     ["legacy-app".to_string()],
///     BTreeMap::from([(
///         "develop".to_string(),
///         definitions::develop_protection(vec!["ci/build".to_string()]),
///     )]),
///     ApiConnection::new(SecretString::from("ghp_example".to_string())),
/// );
///
/// assert!(policy.is_ignored("legacy-app"));
/// assert!(policy.is_supported_branch("develop"));
/// assert!(!policy.is_supported_branch("feature-x"));
/// ```
#[derive(Debug)]
pub struct PolicyStore {
    organization: String,
    repositories_to_ignore: BTreeSet<String>,
    protection_definitions: BTreeMap<String, ProtectionDefinition>,
    api: ApiConnection,
    team_ids_with_write_access: Vec<String>,
}

impl PolicyStore {
    pub fn new(
        organization: impl Into<String>,
        repositories_to_ignore: impl IntoIterator<Item = String>,
        protection_definitions: BTreeMap<String, ProtectionDefinition>,
        api: ApiConnection,
    ) -> Self {
        Self {
            organization: organization.into(),
            repositories_to_ignore: repositories_to_ignore.into_iter().collect(),
            protection_definitions,
            api,
            team_ids_with_write_access: Vec::new(),
        }
    }

    /// Sets the team ids that should be granted write access to every repository.
    pub fn with_team_ids_with_write_access(mut self, team_ids: Vec<String>) -> Self {
        self.team_ids_with_write_access = team_ids;
        self
    }

    /// Loads the policy from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::RequiredConfigMissing` when `GH_ORGANIZATION_NAME` or
    /// `GH_ACCESS_TOKEN` is unset or empty, and `ConfigurationError::InvalidConfiguration`
    /// when an optional connection setting cannot be parsed.
    pub fn from_env() -> ConfigurationResult<Self> {
        Self::from_source(&ProcessEnvironment)
    }

    /// Loads the policy from an arbitrary variable source.
    pub fn from_source(source: &impl VariableSource) -> ConfigurationResult<Self> {
        let organization = required(source, ORGANIZATION_NAME)?.to_lowercase();
        let api = ApiConnection::from_source(source)?;

        let policy = Self::new(
            organization,
            comma_separated(source, REPOSITORIES_IGNORE),
            default_definitions(source),
            api,
        )
        .with_team_ids_with_write_access(comma_separated(source, WRITE_PERMISSION_TEAM_IDS));

        info!(
            organization = policy.organization.as_str(),
            ignored_repositories = policy.repositories_to_ignore.len(),
            supported_branches = ?policy.supported_branches().collect::<Vec<_>>(),
            api_base_url = policy.api.base_url.as_str(),
            "Loaded branch protection policy"
        );

        Ok(policy)
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn repositories_to_ignore(&self) -> &BTreeSet<String> {
        &self.repositories_to_ignore
    }

    /// Returns true when the repository name exactly matches an ignore list entry.
    pub fn is_ignored(&self, repository: &str) -> bool {
        self.repositories_to_ignore.contains(repository)
    }

    pub fn protection_definitions(&self) -> &BTreeMap<String, ProtectionDefinition> {
        &self.protection_definitions
    }

    pub fn protection_definition(&self, branch: &str) -> Option<&ProtectionDefinition> {
        self.protection_definitions.get(branch)
    }

    /// Names of the branches governed by the policy.
    pub fn supported_branches(&self) -> impl Iterator<Item = &str> {
        self.protection_definitions.keys().map(String::as_str)
    }

    pub fn is_supported_branch(&self, branch: &str) -> bool {
        self.protection_definitions.contains_key(branch)
    }

    pub fn api(&self) -> &ApiConnection {
        &self.api
    }

    pub fn team_ids_with_write_access(&self) -> &[String] {
        &self.team_ids_with_write_access
    }
}
