//! The reconciliation engine.
//!
//! A [`Reconciler`] walks the repositories of the organization, picks the branches the
//! policy governs and brings their protection in line: unprotected branches receive the
//! default protection, protected branches are checked against the drift rules.
//!
//! Repositories and branches are reconciled concurrently. A GitHub failure is contained at
//! the branch or repository it happened in and reported as an outcome; only fatal errors
//! (see [`WatcherError::is_fatal`]) abort the run.

use config_manager::PolicyStore;
use futures::future::join_all;
use github_client::{
    endpoints, ApiRequest, BranchSummary, PaginatedClient, ProtectionState, RepositorySummary,
    StatusChecksPatch,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::drift::{default_rules, Correction, DriftRule};
use crate::errors::{WatcherError, WatcherResult};
use crate::outcome::{BranchOutcome, BranchReport, RepositoryReport};

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

/// Reconciles branch protection for the repositories of one organization.
///
/// # Examples
///
/// ```no_run
/// use branch_watcher_core::Reconciler;
/// use config_manager::PolicyStore;
/// use github_client::{OctocrabTransport, PaginatedClient};
/// use std::sync::Arc;
///
/// # async fn example(transport: OctocrabTransport) -> Result<(), Box<dyn std::error::Error>> {
/// let policy = Arc::new(PolicyStore::from_env()?);
/// let reconciler = Reconciler::new(PaginatedClient::new(Arc::new(transport)), policy);
///
/// let repositories = reconciler.list_repositories().await?;
/// let reports = reconciler.reconcile_all(&repositories).await?;
/// println!("reconciled {} repositories", reports.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reconciler {
    client: PaginatedClient,
    policy: Arc<PolicyStore>,
    rules: Vec<Box<dyn DriftRule>>,
}

impl Reconciler {
    /// Creates a reconciler that applies the default drift rules.
    pub fn new(client: PaginatedClient, policy: Arc<PolicyStore>) -> Self {
        Self::with_rules(client, policy, default_rules())
    }

    pub fn with_rules(
        client: PaginatedClient,
        policy: Arc<PolicyStore>,
        rules: Vec<Box<dyn DriftRule>>,
    ) -> Self {
        Self {
            client,
            policy,
            rules,
        }
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Lists the names of all organization repositories that are not ignored.
    ///
    /// The order is the order GitHub reports them in.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn list_repositories(&self) -> WatcherResult<Vec<String>> {
        let request = ApiRequest::get(endpoints::org_repositories(self.policy.organization()));
        let repositories: Vec<RepositorySummary> = self.client.fetch_all_as(request).await?;

        let total = repositories.len();
        let names: Vec<String> = repositories
            .into_iter()
            .map(|repository| repository.name)
            .filter(|name| !self.policy.is_ignored(name))
            .collect();

        info!(
            discovered = total,
            ignored = total - names.len(),
            "Discovered {} repositories to reconcile",
            names.len()
        );
        Ok(names)
    }

    /// Reconciles every given repository concurrently.
    ///
    /// Ignored repositories produce a report without branches. Each report is logged as the
    /// repository name followed by its JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error encountered. Non-fatal failures are part of the
    /// returned reports.
    pub async fn reconcile_all(&self, repositories: &[String]) -> WatcherResult<Vec<RepositoryReport>> {
        let results = join_all(
            repositories
                .iter()
                .map(|repository| self.reconcile_repository(repository)),
        )
        .await;

        let mut reports = Vec::with_capacity(results.len());
        for result in results {
            let report = result?;
            info!(
                repository = report.repository.as_str(),
                "{} {}",
                report.repository,
                serde_json::to_string(&report)?
            );
            reports.push(report);
        }

        Ok(reports)
    }

    async fn reconcile_repository(&self, repository: &str) -> WatcherResult<RepositoryReport> {
        match self.reconcile_branches(repository).await {
            Ok(branches) => Ok(RepositoryReport::completed(repository, branches)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!(repository, error = %e, "Failed to reconcile repository");
                Ok(RepositoryReport::failed(repository, e.to_string()))
            }
        }
    }

    /// Reconciles the supported branches of one repository.
    ///
    /// Branches without a protection definition are skipped. Every supported branch is
    /// handled independently: a failure on one branch is reported as
    /// [`BranchOutcome::Failed`] and does not affect the others.
    ///
    /// # Errors
    ///
    /// Returns an error when the branches cannot be listed or when a fatal error occurs
    /// while reconciling a branch.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn reconcile_branches(&self, repository: &str) -> WatcherResult<Vec<BranchReport>> {
        if self.policy.is_ignored(repository) {
            info!("Skipping ignored repository");
            return Ok(Vec::new());
        }

        let request = ApiRequest::get(endpoints::repository_branches(
            self.policy.organization(),
            repository,
        ));
        let branches: Vec<BranchSummary> = self.client.fetch_all_as(request).await?;

        let supported: Vec<&BranchSummary> = branches
            .iter()
            .filter(|branch| self.policy.is_supported_branch(&branch.name))
            .collect();
        debug!(
            branches = branches.len(),
            supported = supported.len(),
            "Listed repository branches"
        );

        let outcomes = join_all(
            supported
                .iter()
                .map(|branch| self.reconcile_branch(repository, branch)),
        )
        .await;

        let mut reports = Vec::with_capacity(outcomes.len());
        for (branch, outcome) in supported.into_iter().zip(outcomes) {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(branch = branch.name.as_str(), error = %e, "Failed to reconcile branch");
                    BranchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            reports.push(BranchReport::new(branch.name.as_str(), outcome));
        }

        Ok(reports)
    }

    async fn reconcile_branch(
        &self,
        repository: &str,
        branch: &BranchSummary,
    ) -> WatcherResult<BranchOutcome> {
        if !branch.protection_enabled() {
            self.apply_default_protection(repository, &branch.name)
                .await?;
            return Ok(BranchOutcome::AppliedDefaultProtection);
        }

        let state = self.get_branch_protection(repository, &branch.name).await?;
        let correction = self.rules.iter().find_map(|rule| {
            let correction = rule.evaluate(&branch.name, &state)?;
            debug!(
                repository,
                branch = branch.name.as_str(),
                rule = rule.name(),
                "Drift rule matched"
            );
            Some(correction)
        });

        match correction {
            Some(Correction::RelaxStrictStatusChecks) => {
                self.relax_strict_status_checks(repository, &branch.name, false)
                    .await?;
                Ok(BranchOutcome::RelaxedStrictStatusChecks)
            }
            None => {
                debug!(
                    repository,
                    branch = branch.name.as_str(),
                    "Branch protection is compliant"
                );
                Ok(BranchOutcome::NoActionNeeded)
            }
        }
    }

    /// Reads the current protection of a branch.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn get_branch_protection(
        &self,
        repository: &str,
        branch: &str,
    ) -> WatcherResult<ProtectionState> {
        let request = ApiRequest::get(endpoints::branch_protection(
            self.policy.organization(),
            repository,
            branch,
        ));
        Ok(self.client.send_as(request).await?)
    }

    /// Replaces the protection of a branch with the definition the policy holds for it.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::MissingProtectionDefinition`] when the policy has no
    /// definition for `branch`.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn apply_default_protection(&self, repository: &str, branch: &str) -> WatcherResult<()> {
        let definition = self.policy.protection_definition(branch).ok_or_else(|| {
            WatcherError::MissingProtectionDefinition {
                branch: branch.to_string(),
            }
        })?;

        let request = ApiRequest::put(
            endpoints::branch_protection(self.policy.organization(), repository, branch),
            serde_json::to_value(definition)?,
        );
        self.client.send(request).await?;

        info!("Applied default branch protection");
        Ok(())
    }

    /// Sets the `strict` flag of the required status checks of a branch.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn relax_strict_status_checks(
        &self,
        repository: &str,
        branch: &str,
        strict: bool,
    ) -> WatcherResult<()> {
        let request = ApiRequest::patch(
            endpoints::required_status_checks(self.policy.organization(), repository, branch),
            serde_json::to_value(StatusChecksPatch { strict })?,
        );
        self.client.send(request).await?;

        info!("Updated strict status checks");
        Ok(())
    }

    /// Grants the configured teams write access to a repository.
    ///
    /// Not built yet; always fails with [`WatcherError::NotImplemented`].
    // TODO: PUT /teams/{team_id}/repos/{org}/{repo} with `permission: push` for every
    // configured team id.
    #[instrument(skip(self), fields(organization = %self.policy.organization()))]
    pub async fn watch_team_write_permissions(&self, repository: &str) -> WatcherResult<()> {
        warn!(
            teams = ?self.policy.team_ids_with_write_access(),
            "Team write permissions are not reconciled yet"
        );
        Err(WatcherError::NotImplemented {
            capability: "watch_team_write_permissions",
        })
    }
}
