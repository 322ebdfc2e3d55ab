//! Custom handler payloads.
//!
//! The Functions host wraps trigger data in an invocation request and expects an invocation
//! response back. Field names are PascalCase on the wire.

use branch_watcher_core::RunSummary;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Body of `POST /{function}` sent by the Functions host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    /// Trigger payload. For the timer trigger this holds the schedule status.
    #[serde(default)]
    pub data: Value,

    /// Invocation context supplied by the host.
    #[serde(default)]
    pub metadata: Value,
}

impl InvocationRequest {
    /// Extracts the run options from the trigger payload.
    ///
    /// Timer payloads carry no options and produce the default. Returns an error when
    /// `repositories` is present but is not a list of names.
    pub fn run_request(&self) -> Result<RunRequest, serde_json::Error> {
        match &self.data {
            Value::Object(_) => serde_json::from_value(self.data.clone()),
            _ => Ok(RunRequest::default()),
        }
    }
}

/// Options of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Restricts the run to these repositories instead of the whole organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
}

/// Body returned to the Functions host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    /// Output bindings; the timer function has none.
    pub outputs: Map<String, Value>,

    /// Lines appended to the invocation log by the host.
    pub logs: Vec<String>,

    pub return_value: RunSummary,
}

impl InvocationResponse {
    pub fn new(summary: RunSummary) -> Self {
        let logs = vec![format!(
            "Reconciled {} repositories: {} protected, {} relaxed, {} unchanged, {} failed branches, {} failed repositories",
            summary.repositories,
            summary.applied,
            summary.relaxed,
            summary.unchanged,
            summary.failed_branches,
            summary.failed_repositories
        )];

        Self {
            outputs: Map::new(),
            logs,
            return_value: summary,
        }
    }
}
