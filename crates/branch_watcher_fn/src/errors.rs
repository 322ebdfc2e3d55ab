//! Error handling and HTTP error conversion
//!
//! Reconciliation errors are converted to HTTP responses at the handler boundary. The
//! Functions host treats any non-2xx response as a failed invocation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use branch_watcher_core::WatcherError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that fail an invocation.
#[derive(Error, Debug)]
pub enum FunctionError {
    /// The trigger payload could not be interpreted.
    #[error("Invalid invocation request: {0}")]
    InvalidRequest(String),

    /// Repository discovery failed or a fatal reconciliation error occurred.
    #[error("Branch protection run failed: {0}")]
    Reconciliation(#[from] WatcherError),
}

impl FunctionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FunctionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FunctionError::Reconciliation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            FunctionError::InvalidRequest(_) => "InvalidRequest",
            FunctionError::Reconciliation(e) if e.is_fatal() => "ConfigurationError",
            FunctionError::Reconciliation(_) => "ReconciliationError",
        }
    }
}

/// Error body returned for failed invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl From<&FunctionError> for ErrorResponse {
    fn from(error: &FunctionError) -> Self {
        Self {
            error: ErrorDetails {
                code: error.code().to_string(),
                message: error.to_string(),
            },
        }
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        log_error(&self, status);

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Log error with appropriate level based on HTTP status
fn log_error(error: &FunctionError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!("Invocation failed: {} - {}", status, error);
    } else {
        tracing::warn!("Invocation rejected: {} - {}", status, error);
    }
}
