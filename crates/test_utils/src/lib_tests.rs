//! Tests for test utilities.

use super::*;
use github_client::{BranchSummary, PaginatedClient, ProtectionState, RepositorySummary};
use std::sync::Arc;

fn client(fake: &Arc<FakeGitHub>) -> PaginatedClient {
    PaginatedClient::new(fake.clone())
}

#[tokio::test]
async fn test_repository_listing_is_paginated() {
    let fake = Arc::new(FakeGitHub::new("acme").with_page_size(2));
    for name in ["a", "b", "c", "d", "e"] {
        fake.add_repository(name);
    }

    let repositories: Vec<RepositorySummary> = client(&fake)
        .fetch_all_as(ApiRequest::get("/orgs/acme/repos"))
        .await
        .unwrap();

    let names: Vec<String> = repositories.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(fake.requests().len(), 3);
}

#[tokio::test]
async fn test_put_protection_marks_branch_protected() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "master");

    client(&fake)
        .send(ApiRequest::put(
            "/repos/acme/svc-a/branches/master/protection",
            json!({
                "required_status_checks": null,
                "required_pull_request_reviews": null,
                "enforce_admins": false,
                "restrictions": { "users": ["alice"], "teams": [] }
            }),
        ))
        .await
        .unwrap();

    let branches: Vec<BranchSummary> = client(&fake)
        .fetch_all_as(ApiRequest::get("/repos/acme/svc-a/branches"))
        .await
        .unwrap();
    assert!(branches[0].protection_enabled());

    let state: ProtectionState = client(&fake)
        .send_as(ApiRequest::get("/repos/acme/svc-a/branches/master/protection"))
        .await
        .unwrap();
    assert_eq!(state.restrictions.as_present().unwrap().users[0].login, "alice");
    assert!(state.required_status_checks.is_absent());
}

#[tokio::test]
async fn test_patch_updates_strict_flag() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch(
        "svc-a",
        "develop",
        json!({ "required_status_checks": { "strict": true, "contexts": [] } }),
    );

    client(&fake)
        .send(ApiRequest::patch(
            "/repos/acme/svc-a/branches/develop/protection/required_status_checks",
            json!({ "strict": false }),
        ))
        .await
        .unwrap();

    assert_eq!(
        fake.protection("svc-a", "develop").unwrap()["required_status_checks"]["strict"],
        json!(false)
    );
}

#[tokio::test]
async fn test_injected_failure() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_repository("svc-a")
        .fail_request(Method::GET, "/repos/acme/svc-a/branches", 500);

    let result = client(&fake)
        .fetch_all(ApiRequest::get("/repos/acme/svc-a/branches"))
        .await;

    assert!(matches!(result, Err(Error::ApiStatus { status: 500, .. })));
}

#[test]
fn test_protection_from_definition() {
    let definition = json!({
        "required_status_checks": { "strict": true, "contexts": ["ci/build"] },
        "required_pull_request_reviews": {
            "dismissal_restrictions": {},
            "dismiss_stale_reviews": false
        },
        "enforce_admins": true,
        "restrictions": null
    });

    assert_eq!(
        protection_from_definition(&definition),
        json!({
            "required_status_checks": { "strict": true, "contexts": ["ci/build"] },
            "required_pull_request_reviews": { "dismiss_stale_reviews": false },
            "enforce_admins": { "enabled": true }
        })
    );
}
