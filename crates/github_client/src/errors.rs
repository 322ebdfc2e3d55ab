//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when talking to the GitHub REST API
//! through the github_client crate. Errors are returned unchanged to the caller; this crate
//! performs no retries.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.fetch_all(request).await {
///     Ok(items) => println!("Fetched {} items", items.len()),
///     Err(Error::RateLimitExceeded { path }) => eprintln!("Rate limited on {path}"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GitHub answered with a non-success status code that has no dedicated variant.
    ///
    /// The message is taken from the `message` field of the GitHub error payload when
    /// one is present, otherwise it holds the raw response body.
    #[error("GitHub API request to {path} failed with status {status}: {message}")]
    ApiStatus {
        status: u16,
        path: String,
        message: String,
    },

    /// Authentication or GitHub client initialization failure.
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    ///
    /// This error occurs when the GitHub API returns a body that is not valid JSON,
    /// or that cannot be mapped onto the expected model.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The request could not be delivered or the response could not be read.
    #[error("Failed to send request to {path}: {reason}")]
    Transport { path: String, reason: String },

    /// The request used an HTTP method that the transport does not support.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The requested resource was not found (HTTP 404).
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// GitHub API rate limit has been exceeded.
    ///
    /// Callers that want to recover should back off until the time given in the
    /// `X-RateLimit-Reset` header before trying again.
    #[error("Rate limit exceeded while requesting {path}")]
    RateLimitExceeded { path: String },

    /// A `next` link pointed back to a page that had already been fetched.
    #[error("Pagination cycle detected: page {path} was already visited")]
    PaginationCycle { path: String },

    /// More pages were offered than the configured page cap allows.
    #[error("Pagination stopped after reaching the limit of {limit} pages")]
    PageLimitExceeded { limit: usize },
}

impl Error {
    /// Returns the HTTP status code associated with this error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiStatus { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(404),
            Error::RateLimitExceeded { .. } => Some(429),
            _ => None,
        }
    }
}
