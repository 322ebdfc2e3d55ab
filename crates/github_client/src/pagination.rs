//! Link-header pagination.
//!
//! GitHub splits list endpoints into pages and advertises the next page through the
//! `Link` response header (`<https://api.github.com/...?page=2>; rel="next"`). The
//! [`PaginatedClient`] follows those links with an explicit cursor loop and folds the
//! pages into a single ordered collection.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::{ApiRequest, ApiResponse, ApiTransport, Error};

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;

/// Points at the next page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl PageCursor {
    /// Builds a cursor from the target of a link relation.
    ///
    /// Absolute URLs are reduced to their path and query, relative references are
    /// accepted as-is. Returns `None` when the target cannot be parsed.
    pub fn from_link_target(target: &str) -> Option<Self> {
        let url = match Url::parse(target) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://localhost").ok()?.join(target).ok()?
            }
            Err(_) => return None,
        };

        Some(Self {
            path: url.path().to_string(),
            query: url.query_pairs().into_owned().collect(),
        })
    }

    /// Turns the cursor into the `GET` request for the page it points at.
    pub fn into_request(self) -> ApiRequest {
        ApiRequest {
            query: self.query,
            ..ApiRequest::get(self.path)
        }
    }
}

/// Extracts the `rel="next"` target from a `Link` header value.
///
/// Malformed entries are skipped rather than treated as errors, a header without a
/// usable next relation ends pagination.
pub fn parse_next_link(header: &str) -> Option<PageCursor> {
    let mut rest = header;
    while let Some(start) = rest.find('<') {
        let after_open = &rest[start + 1..];
        let end = after_open.find('>')?;
        let target = &after_open[..end];

        let tail = &after_open[end + 1..];
        let params = match tail.find('<') {
            Some(next_entry) => &tail[..next_entry],
            None => tail,
        };

        if params.split(';').any(is_next_relation) {
            return PageCursor::from_link_target(target.trim());
        }

        rest = &tail[params.len()..];
    }

    None
}

fn is_next_relation(param: &str) -> bool {
    let Some((key, value)) = param.split_once('=') else {
        return false;
    };
    if !key.trim().eq_ignore_ascii_case("rel") {
        return false;
    }

    value
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .any(|relation| relation.eq_ignore_ascii_case("next"))
}

/// Issues GitHub API requests and transparently follows `next` page links.
///
/// # Examples
///
/// ```rust,no_run
/// use github_client::{create_token_client, ApiRequest, OctocrabTransport, PaginatedClient};
/// use secrecy::SecretString;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), github_client::Error> {
/// let token = SecretString::from("ghp_example".to_string());
/// let octocrab = create_token_client("https://api.github.com", "application/vnd.github+json", &token)?;
/// let client = PaginatedClient::new(Arc::new(OctocrabTransport::new(octocrab)));
///
/// let repositories = client.fetch_all(ApiRequest::get("/orgs/acme/repos")).await?;
/// println!("Found {} repositories", repositories.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PaginatedClient {
    transport: Arc<dyn ApiTransport>,
    max_pages: usize,
}

impl PaginatedClient {
    /// Maximum number of pages followed for a single listing unless configured otherwise.
    pub const DEFAULT_MAX_PAGES: usize = 1000;

    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            max_pages: Self::DEFAULT_MAX_PAGES,
        }
    }

    /// Sets the maximum number of pages a single listing may span.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Starts a lazy walk over the pages of `request`.
    pub fn pages(&self, request: ApiRequest) -> Pages<'_> {
        Pages {
            client: self,
            next: Some(request),
            visited: HashSet::new(),
            fetched: 0,
        }
    }

    /// Fetches every page of `request` and concatenates the results in order.
    ///
    /// Array pages contribute their elements, any other JSON page contributes itself as a
    /// single item. Empty bodies contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any page: a non-success status, a JSON decode
    /// failure, a pagination cycle or the page cap being exceeded.
    pub async fn fetch_all(&self, request: ApiRequest) -> Result<Vec<Value>, Error> {
        let mut items = Vec::new();
        let mut pages = self.pages(request);
        while let Some(page) = pages.next_page().await {
            match page? {
                Value::Array(elements) => items.extend(elements),
                Value::Null => {}
                other => items.push(other),
            }
        }

        debug!(
            item_count = items.len(),
            page_count = pages.fetched,
            "Finished paginated fetch"
        );
        Ok(items)
    }

    /// Fetches every page and decodes each item into `T`.
    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<T>, Error> {
        self.fetch_all(request)
            .await?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }

    /// Performs a single exchange without following links and returns the decoded body.
    ///
    /// An empty body decodes to `Value::Null`.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, Error> {
        let response = self.exchange(&request).await?;
        decode_body(&response.body)
    }

    /// Performs a single exchange and decodes the body into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn exchange(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        info!(
            method = %request.method,
            path = %request.uri(),
            "Sending GitHub API request"
        );

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let error = error_for_status(&request.path, &response);
        warn!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            error = %error,
            "GitHub API request failed"
        );
        Err(error)
    }
}

impl fmt::Debug for PaginatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedClient")
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// A lazy sequence of decoded pages.
///
/// Each call to [`Pages::next_page`] performs at most one request. The walk ends after
/// the first page without a `next` link, or after the first error.
pub struct Pages<'a> {
    client: &'a PaginatedClient,
    next: Option<ApiRequest>,
    visited: HashSet<String>,
    fetched: usize,
}

impl Pages<'_> {
    /// Fetches the next page, or returns `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Option<Result<Value, Error>> {
        let request = self.next.take()?;
        Some(self.fetch(request).await)
    }

    /// Number of pages fetched so far.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    async fn fetch(&mut self, request: ApiRequest) -> Result<Value, Error> {
        let uri = request.uri();
        if !self.visited.insert(uri.clone()) {
            return Err(Error::PaginationCycle { path: uri });
        }
        if self.fetched >= self.client.max_pages {
            return Err(Error::PageLimitExceeded {
                limit: self.client.max_pages,
            });
        }

        let response = self.client.exchange(&request).await?;
        self.fetched += 1;

        let page = decode_body(&response.body)?;
        self.next = response
            .link
            .as_deref()
            .and_then(parse_next_link)
            .map(PageCursor::into_request);
        Ok(page)
    }
}

fn decode_body(body: &str) -> Result<Value, Error> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

fn error_for_status(path: &str, response: &ApiResponse) -> Error {
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|payload| {
            payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| response.body.clone());

    let path = path.to_string();
    match response.status {
        404 => Error::NotFound { path },
        429 => Error::RateLimitExceeded { path },
        403 if message.to_ascii_lowercase().contains("rate limit") => {
            Error::RateLimitExceeded { path }
        }
        status => Error::ApiStatus {
            status,
            path,
            message,
        },
    }
}
