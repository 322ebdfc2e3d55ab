//! Request descriptors and the transport seam.
//!
//! An [`ApiRequest`] describes a single logical call against the GitHub REST API. It is
//! handed to an [`ApiTransport`], which performs the HTTP exchange and returns a
//! transport-neutral [`ApiResponse`].

use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use url::form_urlencoded;

use crate::Error;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Describes a single request against the GitHub REST API.
///
/// Connection level details (host, credentials, accept header) belong to the transport,
/// the descriptor only carries what changes from call to call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request with the given method and path and no query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `PUT` request carrying a JSON body.
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    /// Creates a `PATCH` request carrying a JSON body.
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a query parameter. Parameters are rendered in insertion order.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Renders the path and url-encoded query, e.g. `/orgs/acme/repos?page=2`.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// The parts of an HTTP response the client cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw value of the `Link` header, if any.
    pub link: Option<String>,
    /// Response body as text. Empty for `204 No Content`.
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            link: None,
            body: body.into(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Returns true for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP exchanges with the GitHub API.
///
/// Implementations must not interpret the status code; mapping non-success responses to
/// errors is done by the [`PaginatedClient`](crate::PaginatedClient). Only failures to
/// deliver the request or read the response are reported as errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error>;
}
