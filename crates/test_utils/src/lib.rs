//! Test utilities shared by the workspace crates.
//!
//! [`FakeGitHub`] is an in-memory stand-in for the parts of the GitHub REST API used by the
//! branch watcher. It implements [`ApiTransport`], keeps repository, branch and protection
//! state, paginates listings with `Link` headers, records every request and can be told to
//! fail specific calls.

use async_trait::async_trait;
use github_client::{ApiRequest, ApiResponse, ApiTransport, Error};
use http::Method;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

#[derive(Debug, Clone)]
struct FakeBranch {
    name: String,
    protection: Option<Value>,
}

#[derive(Debug, Clone)]
struct FakeRepository {
    name: String,
    branches: Vec<FakeBranch>,
}

#[derive(Debug, Default)]
struct FakeState {
    repositories: Vec<FakeRepository>,
    failures: HashMap<(Method, String), u16>,
    requests: Vec<ApiRequest>,
}

/// In-memory GitHub organization.
#[derive(Debug)]
pub struct FakeGitHub {
    organization: String,
    page_size: usize,
    state: Mutex<FakeState>,
}

impl FakeGitHub {
    pub const DEFAULT_PAGE_SIZE: usize = 30;

    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Sets the number of items returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn add_repository(&self, name: &str) -> &Self {
        self.lock().repositories.push(FakeRepository {
            name: name.to_string(),
            branches: Vec::new(),
        });
        self
    }

    /// Adds a branch without protection. The repository is created when missing.
    pub fn add_branch(&self, repository: &str, branch: &str) -> &Self {
        self.insert_branch(repository, branch, None)
    }

    /// Adds a protected branch whose protection endpoint returns `protection` (read shape).
    pub fn add_protected_branch(&self, repository: &str, branch: &str, protection: Value) -> &Self {
        self.insert_branch(repository, branch, Some(protection))
    }

    /// Makes every request with the given method and path answer with `status`.
    pub fn fail_request(&self, method: Method, path: &str, status: u16) -> &Self {
        self.lock().failures.insert((method, path.to_string()), status);
        self
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// All requests that were not `GET`s.
    pub fn writes(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method != Method::GET)
            .collect()
    }

    /// Requests whose path starts with `prefix`.
    pub fn requests_under(&self, prefix: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path.starts_with(prefix))
            .collect()
    }

    /// Current protection of a branch in read shape, `None` when unprotected.
    pub fn protection(&self, repository: &str, branch: &str) -> Option<Value> {
        self.lock()
            .repositories
            .iter()
            .find(|r| r.name == repository)?
            .branches
            .iter()
            .find(|b| b.name == branch)?
            .protection
            .clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert_branch(&self, repository: &str, branch: &str, protection: Option<Value>) -> &Self {
        let mut state = self.lock();
        let index = match state.repositories.iter().position(|r| r.name == repository) {
            Some(index) => index,
            None => {
                state.repositories.push(FakeRepository {
                    name: repository.to_string(),
                    branches: Vec::new(),
                });
                state.repositories.len() - 1
            }
        };
        state.repositories[index].branches.push(FakeBranch {
            name: branch.to_string(),
            protection,
        });
        drop(state);
        self
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if let Some(status) = state
            .failures
            .get(&(request.method.clone(), request.path.clone()))
        {
            return error_response(*status, "Injected failure");
        }

        let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["orgs", org, "repos"] if request.method == Method::GET => {
                if *org != self.organization {
                    return error_response(404, "Not Found");
                }
                let items = state
                    .repositories
                    .iter()
                    .map(|r| json!({ "name": r.name, "private": true }))
                    .collect();
                self.page(request, items)
            }
            ["repos", org, repo, "branches"] if request.method == Method::GET => {
                let Some(repository) = find_repository(&state, &self.organization, org, repo)
                else {
                    return error_response(404, "Not Found");
                };
                let items = repository
                    .branches
                    .iter()
                    .map(|b| {
                        json!({
                            "name": b.name,
                            "protected": b.protection.is_some(),
                            "protection": { "enabled": b.protection.is_some() }
                        })
                    })
                    .collect();
                self.page(request, items)
            }
            ["repos", org, repo, "branches", branch, "protection"] => {
                let Some(existing) =
                    find_branch(&mut state, &self.organization, org, repo, branch)
                else {
                    return error_response(404, "Branch not found");
                };
                if request.method == Method::GET {
                    match &existing.protection {
                        Some(protection) => json_response(200, protection.clone()),
                        None => error_response(404, "Branch not protected"),
                    }
                } else if request.method == Method::PUT {
                    let definition = request.body.clone().unwrap_or(Value::Null);
                    let protection = protection_from_definition(&definition);
                    existing.protection = Some(protection.clone());
                    json_response(200, protection)
                } else {
                    error_response(405, "Method Not Allowed")
                }
            }
            ["repos", org, repo, "branches", branch, "protection", "required_status_checks"]
                if request.method == Method::PATCH =>
            {
                let Some(existing) =
                    find_branch(&mut state, &self.organization, org, repo, branch)
                else {
                    return error_response(404, "Branch not found");
                };
                let checks = existing
                    .protection
                    .as_mut()
                    .and_then(|p| p.get_mut("required_status_checks"))
                    .filter(|checks| checks.is_object());
                let Some(checks) = checks else {
                    return error_response(404, "Required status checks not enabled");
                };
                if let Some(strict) = request.body.as_ref().and_then(|b| b.get("strict")) {
                    checks["strict"] = strict.clone();
                }
                json_response(200, checks.clone())
            }
            _ => error_response(404, "Not Found"),
        }
    }

    fn page(&self, request: &ApiRequest, items: Vec<Value>) -> ApiResponse {
        let page: usize = request
            .query
            .iter()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(1);

        let start = page.saturating_sub(1).saturating_mul(self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());
        let body = Value::Array(items[start..end].to_vec()).to_string();

        let mut response = ApiResponse::new(200, body);
        if end < items.len() {
            response = response.with_link(format!(
                "<https://api.github.com{}?page={}>; rel=\"next\"",
                request.path,
                page + 1
            ));
        }
        response
    }
}

#[async_trait]
impl ApiTransport for FakeGitHub {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        debug!(method = %request.method, path = %request.uri(), "Fake GitHub received request");
        Ok(self.handle(request))
    }
}

fn find_repository<'a>(
    state: &'a FakeState,
    organization: &str,
    org: &str,
    repo: &str,
) -> Option<&'a FakeRepository> {
    if org != organization {
        return None;
    }
    state.repositories.iter().find(|r| r.name == repo)
}

fn find_branch<'a>(
    state: &'a mut FakeState,
    organization: &str,
    org: &str,
    repo: &str,
    branch: &str,
) -> Option<&'a mut FakeBranch> {
    if org != organization {
        return None;
    }
    state
        .repositories
        .iter_mut()
        .find(|r| r.name == repo)?
        .branches
        .iter_mut()
        .find(|b| b.name == branch)
}

fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

fn error_response(status: u16, message: &str) -> ApiResponse {
    json_response(status, json!({ "message": message }))
}

/// Converts a protection definition (write shape) into what GitHub reports when reading the
/// protection back (read shape).
pub fn protection_from_definition(definition: &Value) -> Value {
    let mut protection = Map::new();

    if let Some(checks) = definition
        .get("required_status_checks")
        .filter(|v| v.is_object())
    {
        protection.insert("required_status_checks".to_string(), checks.clone());
    }

    if let Some(reviews) = definition
        .get("required_pull_request_reviews")
        .filter(|v| v.is_object())
    {
        let mut read_reviews = Map::new();
        read_reviews.insert(
            "dismiss_stale_reviews".to_string(),
            reviews
                .get("dismiss_stale_reviews")
                .cloned()
                .unwrap_or(Value::Bool(false)),
        );
        if let Some(restrictions) = reviews
            .get("dismissal_restrictions")
            .filter(|r| r.get("users").is_some() || r.get("teams").is_some())
        {
            read_reviews.insert(
                "dismissal_restrictions".to_string(),
                principals(restrictions),
            );
        }
        protection.insert(
            "required_pull_request_reviews".to_string(),
            Value::Object(read_reviews),
        );
    }

    protection.insert(
        "enforce_admins".to_string(),
        json!({
            "enabled": definition
                .get("enforce_admins")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        }),
    );

    if let Some(restrictions) = definition.get("restrictions").filter(|v| v.is_object()) {
        protection.insert("restrictions".to_string(), principals(restrictions));
    }

    Value::Object(protection)
}

fn principals(restrictions: &Value) -> Value {
    let names = |key: &str| -> Vec<String> {
        restrictions
            .get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    json!({
        "users": names("users").into_iter().map(|login| json!({ "login": login })).collect::<Vec<_>>(),
        "teams": names("teams").into_iter().map(|slug| json!({ "slug": slug })).collect::<Vec<_>>(),
    })
}
