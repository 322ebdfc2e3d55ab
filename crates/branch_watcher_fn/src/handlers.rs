//! HTTP request handlers
//!
//! The invocation handler runs one reconciliation pass and reports its summary back to the
//! Functions host.

use axum::{extract::State, Json};
use branch_watcher_core::{Reconciler, RunSummary};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::FunctionError,
    models::{InvocationRequest, InvocationResponse},
    AppState,
};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// POST /{function}
///
/// Entry point for the timer trigger.
pub async fn run_branch_protection(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Result<Json<InvocationResponse>, FunctionError> {
    let summary = handle_invocation(&state.reconciler, &request).await?;
    Ok(Json(InvocationResponse::new(summary)))
}

/// Runs one reconciliation pass for an invocation.
///
/// The whole organization is reconciled unless the trigger data names the repositories to
/// process. Ignored repositories are skipped in both cases.
///
/// # Errors
///
/// Fails when the trigger data is malformed, when repository discovery fails or when a
/// fatal reconciliation error occurs. Failures of single repositories or branches only show
/// up in the summary.
pub async fn handle_invocation(
    reconciler: &Reconciler,
    request: &InvocationRequest,
) -> Result<RunSummary, FunctionError> {
    info!(
        data = %request.data,
        metadata = %request.metadata,
        "Received branch protection invocation"
    );

    let run = request
        .run_request()
        .map_err(|e| FunctionError::InvalidRequest(e.to_string()))?;

    let repositories = match run.repositories {
        Some(requested) => {
            let policy = reconciler.policy();
            let (ignored, selected): (Vec<String>, Vec<String>) = requested
                .into_iter()
                .partition(|repository| policy.is_ignored(repository));
            if !ignored.is_empty() {
                warn!(?ignored, "Skipping requested repositories on the ignore list");
            }
            selected
        }
        None => reconciler.list_repositories().await?,
    };

    let reports = reconciler.reconcile_all(&repositories).await?;
    let summary = RunSummary::from_reports(&reports);

    info!(
        organization = reconciler.policy().organization(),
        repositories = summary.repositories,
        applied = summary.applied,
        relaxed = summary.relaxed,
        unchanged = summary.unchanged,
        failed_branches = summary.failed_branches,
        failed_repositories = summary.failed_repositories,
        "Finished branch protection run"
    );

    Ok(summary)
}

/// GET /health
///
/// Liveness probe.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
}
