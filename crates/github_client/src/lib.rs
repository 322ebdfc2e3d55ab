//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides the pieces the branch watcher needs to talk to GitHub:
//!
//! - [`ApiRequest`] descriptors and the [`ApiTransport`] seam that performs HTTP exchanges,
//! - [`OctocrabTransport`], the production transport built on an authenticated `Octocrab`
//!   client,
//! - [`PaginatedClient`], which follows `Link` header pagination and maps failed
//!   responses to [`Error`]s,
//! - typed models for repositories, branches and branch protection.

use async_trait::async_trait;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, instrument};

pub mod errors;
pub use errors::Error;

pub mod branch_protection;
pub use branch_protection::{
    DismissalRestrictions, DismissalRestrictionsState, EnforceAdminsState, Presence,
    ProtectionDefinition, ProtectionState, PullRequestReviewsDefinition, PullRequestReviewsState,
    RestrictionsDefinition, RestrictionsState, StatusChecksDefinition, StatusChecksPatch,
    StatusChecksState, TeamRef, UserRef,
};

pub mod endpoints;

pub mod models;
pub use models::{BranchProtectionFlag, BranchSummary, RepositorySummary};

pub mod pagination;
pub use pagination::{parse_next_link, PageCursor, PaginatedClient, Pages};

pub mod request;
pub use request::{ApiRequest, ApiResponse, ApiTransport};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// An [`ApiTransport`] that sends requests through an authenticated `Octocrab` client.
///
/// Requests are issued with octocrab's raw request methods so that the status code and
/// the `Link` header stay visible to the caller.
#[derive(Debug, Clone)]
pub struct OctocrabTransport {
    client: Octocrab,
}

impl OctocrabTransport {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiTransport for OctocrabTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let uri = request.uri();
        let body = request.body.as_ref();

        let result = match request.method.as_str() {
            "GET" => self.client._get(uri.as_str()).await,
            "PUT" => self.client._put(uri.as_str(), body).await,
            "PATCH" => self.client._patch(uri.as_str(), body).await,
            "POST" => self.client._post(uri.as_str(), body).await,
            other => return Err(Error::UnsupportedMethod(other.to_string())),
        };

        let response = result.map_err(|e| {
            let reason = e.to_string();
            log_octocrab_error("Failed to send GitHub API request", e);
            Error::Transport {
                path: request.path.clone(),
                reason,
            }
        })?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(http::header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = self.client.body_to_string(response).await.map_err(|e| {
            let reason = e.to_string();
            log_octocrab_error("Failed to read GitHub API response body", e);
            Error::Transport {
                path: request.path.clone(),
                reason,
            }
        })?;

        Ok(ApiResponse { status, link, body })
    }
}

/// Creates an `Octocrab` client that authenticates with a personal access token.
///
/// # Arguments
///
/// * `base_url` - Root of the GitHub REST API, e.g. `https://api.github.com`.
/// * `accept` - Value of the `Accept` header sent with every request.
/// * `token` - The access token, sent as a bearer credential.
///
/// # Errors
///
/// Returns an `Error::AuthError` if the base URL is invalid or the client cannot be built.
#[instrument(skip(token))]
pub fn create_token_client(
    base_url: &str,
    accept: &str,
    token: &SecretString,
) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .base_uri(base_url)
        .map_err(|e| {
            error!(base_url = base_url, error = %e, "Invalid GitHub API base URL");
            Error::AuthError(format!("Invalid GitHub API base URL '{}': {}", base_url, e))
        })?
        .add_header(http::header::ACCEPT, accept.to_string())
        .personal_token(token.expose_secret().to_string())
        .build()
        .map_err(|e| {
            error!(error = %e, "Failed to build Octocrab client with access token");
            Error::AuthError("Failed to build a GitHub client for the access token.".to_string())
        })
}

fn log_octocrab_error(message: &str, e: octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            let err = source;
            error!(
                error_message = err.message,
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            )
        }
        octocrab::Error::UriParse { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::Uri { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}, Failed to parse URI.",
            message
        ),
        octocrab::Error::InvalidHeaderValue { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. One of the header values was invalid.",
            message
        ),
        octocrab::Error::InvalidUtf8 { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. The message wasn't valid UTF-8.",
            message,
        ),
        _ => error!(error_message = e.to_string(), message),
    };
}
