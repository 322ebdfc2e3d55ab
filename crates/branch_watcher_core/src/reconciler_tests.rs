//! Tests for the reconciler, run against the in-memory GitHub fake.

use super::*;
use crate::drift::StrictStatusChecksRule;
use crate::outcome::RunSummary;
use config_manager::environment::{
    ACCESS_TOKEN, DEVELOP_REQUIRED_STATUS_CHECKS, MASTER_RESTRICT_TO_USERS, ORGANIZATION_NAME,
    REPOSITORIES_IGNORE,
};
use http::Method;
use serde_json::{json, Value};
use std::collections::HashMap;
use test_utils::FakeGitHub;
use tracing_test::traced_test;

fn policy(ignore: &str) -> Arc<PolicyStore> {
    let vars = HashMap::from([
        (ORGANIZATION_NAME, "acme"),
        (ACCESS_TOKEN, "ghp_test"),
        (REPOSITORIES_IGNORE, ignore),
        (DEVELOP_REQUIRED_STATUS_CHECKS, "ci/build"),
        (MASTER_RESTRICT_TO_USERS, "alice"),
    ]);
    Arc::new(PolicyStore::from_source(&vars).expect("Failed to build policy"))
}

fn reconciler(fake: &Arc<FakeGitHub>, ignore: &str) -> Reconciler {
    Reconciler::new(PaginatedClient::new(fake.clone()), policy(ignore))
}

fn strict_develop_protection(strict: bool) -> Value {
    json!({
        "url": "https://api.github.com/repos/acme/svc-a/branches/develop/protection",
        "required_status_checks": { "strict": strict, "contexts": ["ci/build"] },
        "enforce_admins": { "enabled": false }
    })
}

fn outcome_of<'a>(reports: &'a [BranchReport], branch: &str) -> &'a BranchOutcome {
    &reports
        .iter()
        .find(|report| report.branch == branch)
        .unwrap_or_else(|| panic!("no report for {}", branch))
        .outcome
}

#[tokio::test]
async fn test_list_repositories_excludes_ignored_and_keeps_order() {
    let fake = Arc::new(FakeGitHub::new("acme").with_page_size(2));
    for name in ["svc-a", "legacy-app", "svc-b", "legacy", "svc-c"] {
        fake.add_repository(name);
    }

    let names = reconciler(&fake, "legacy-app")
        .list_repositories()
        .await
        .expect("Failed to list repositories");

    assert_eq!(names, vec!["svc-a", "svc-b", "legacy", "svc-c"]);
    assert_eq!(fake.requests_under("/orgs/acme/repos").len(), 3);
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_list_repositories_of_empty_organization() {
    let fake = Arc::new(FakeGitHub::new("acme"));

    let names = reconciler(&fake, "").list_repositories().await.unwrap();

    assert!(names.is_empty());
}

#[tokio::test]
async fn test_list_repositories_surfaces_discovery_failure() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_repository("svc-a");
    fake.fail_request(Method::GET, "/orgs/acme/repos", 500);

    let result = reconciler(&fake, "").list_repositories().await;

    assert!(matches!(
        result,
        Err(WatcherError::GitHub(github_client::Error::ApiStatus {
            status: 500,
            ..
        }))
    ));
}

#[tokio::test]
async fn test_svc_a_scenario_relaxes_develop_only() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(true));
    fake.add_branch("svc-a", "feature-x");

    let reports = reconciler(&fake, "")
        .reconcile_branches("svc-a")
        .await
        .expect("Failed to reconcile svc-a");

    assert_eq!(
        reports,
        vec![BranchReport::new(
            "develop",
            BranchOutcome::RelaxedStrictStatusChecks
        )]
    );

    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, Method::PATCH);
    assert_eq!(
        writes[0].path,
        "/repos/acme/svc-a/branches/develop/protection/required_status_checks"
    );
    assert_eq!(writes[0].body, Some(json!({ "strict": false })));

    assert!(fake
        .requests_under("/repos/acme/svc-a/branches/feature-x")
        .is_empty());
    assert!(fake
        .requests_under("/repos/acme/svc-a/branches/master")
        .is_empty());
}

#[tokio::test]
async fn test_unsupported_branches_are_never_touched() {
    let fake = Arc::new(FakeGitHub::new("acme").with_page_size(2));
    for branch in ["feature-x", "main", "release/1.0", "Develop", "hotfix"] {
        fake.add_branch("svc-a", branch);
    }

    let reports = reconciler(&fake, "")
        .reconcile_branches("svc-a")
        .await
        .unwrap();

    assert!(reports.is_empty());
    assert!(fake.writes().is_empty());
    assert_eq!(fake.requests().len(), 3);
}

#[tokio::test]
async fn test_unprotected_branch_receives_exact_definition() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "master");

    let reconciler = reconciler(&fake, "");
    let reports = reconciler.reconcile_branches("svc-a").await.unwrap();

    assert_eq!(
        reports,
        vec![BranchReport::new(
            "master",
            BranchOutcome::AppliedDefaultProtection
        )]
    );

    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, Method::PUT);
    assert_eq!(writes[0].path, "/repos/acme/svc-a/branches/master/protection");
    let expected = serde_json::to_value(reconciler.policy().protection_definition("master").unwrap())
        .unwrap();
    assert_eq!(writes[0].body, Some(expected));
    assert_eq!(
        writes[0].body,
        Some(json!({
            "required_status_checks": null,
            "required_pull_request_reviews": null,
            "enforce_admins": false,
            "restrictions": { "users": ["alice"], "teams": [] }
        }))
    );
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "master");
    let reconciler = reconciler(&fake, "");

    reconciler.reconcile_branches("svc-a").await.unwrap();
    let second = reconciler.reconcile_branches("svc-a").await.unwrap();

    assert_eq!(
        second,
        vec![BranchReport::new("master", BranchOutcome::NoActionNeeded)]
    );
    assert_eq!(fake.writes().len(), 1);
}

#[tokio::test]
async fn test_bootstrapped_develop_is_relaxed_on_the_next_run() {
    // The default develop definition asks for strict checks, which the drift rule relaxes.
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "develop");
    let reconciler = reconciler(&fake, "");

    let outcomes: Vec<BranchOutcome> = {
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            let reports = reconciler.reconcile_branches("svc-a").await.unwrap();
            outcomes.push(outcome_of(&reports, "develop").clone());
        }
        outcomes
    };

    assert_eq!(
        outcomes,
        vec![
            BranchOutcome::AppliedDefaultProtection,
            BranchOutcome::RelaxedStrictStatusChecks,
            BranchOutcome::NoActionNeeded,
        ]
    );
    assert_eq!(fake.writes().len(), 2);
}

#[tokio::test]
async fn test_drift_correction_scope() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "master", strict_develop_protection(true));
    fake.add_protected_branch("svc-b", "develop", strict_develop_protection(false));
    fake.add_protected_branch(
        "svc-c",
        "develop",
        json!({ "required_status_checks": null, "enforce_admins": { "enabled": false } }),
    );
    fake.add_protected_branch("svc-d", "develop", json!({ "enforce_admins": { "enabled": true } }));
    let reconciler = reconciler(&fake, "");

    for repository in ["svc-a", "svc-b", "svc-c", "svc-d"] {
        let reports = reconciler.reconcile_branches(repository).await.unwrap();
        assert_eq!(reports.len(), 1, "{}", repository);
        assert_eq!(reports[0].outcome, BranchOutcome::NoActionNeeded, "{}", repository);
    }

    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_custom_rules_replace_defaults() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "master", strict_develop_protection(true));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(true));

    let reconciler = Reconciler::with_rules(
        PaginatedClient::new(fake.clone()),
        policy(""),
        vec![Box::new(StrictStatusChecksRule::new("master"))],
    );
    let reports = reconciler.reconcile_branches("svc-a").await.unwrap();

    assert_eq!(
        outcome_of(&reports, "master"),
        &BranchOutcome::RelaxedStrictStatusChecks
    );
    assert_eq!(outcome_of(&reports, "develop"), &BranchOutcome::NoActionNeeded);
}

#[tokio::test]
async fn test_branch_failure_does_not_affect_siblings() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(true));
    fake.add_branch("svc-a", "master");
    fake.fail_request(
        Method::GET,
        "/repos/acme/svc-a/branches/develop/protection",
        500,
    );

    let reports = reconciler(&fake, "")
        .reconcile_branches("svc-a")
        .await
        .expect("Branch failures must not fail the repository");

    assert!(outcome_of(&reports, "develop").is_failure());
    assert_eq!(
        outcome_of(&reports, "master"),
        &BranchOutcome::AppliedDefaultProtection
    );
    assert!(fake
        .protection("svc-a", "master")
        .is_some_and(|protection| protection["restrictions"]["users"][0]["login"] == "alice"));
}

#[tokio::test]
async fn test_failed_write_is_reported_per_branch() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "master");
    fake.fail_request(
        Method::PUT,
        "/repos/acme/svc-a/branches/master/protection",
        403,
    );

    let reports = reconciler(&fake, "")
        .reconcile_branches("svc-a")
        .await
        .unwrap();

    match outcome_of(&reports, "master") {
        BranchOutcome::Failed { error } => assert!(error.contains("403"), "{}", error),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_repository_failure_does_not_affect_others() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-x", "master");
    fake.add_branch("svc-y", "master");
    fake.fail_request(Method::GET, "/repos/acme/svc-x/branches", 502);

    let reports = reconciler(&fake, "")
        .reconcile_all(&["svc-x".to_string(), "svc-y".to_string()])
        .await
        .expect("Repository failures must not fail the run");

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].repository, "svc-x");
    assert!(reports[0].is_failure());
    assert!(reports[0].branches.is_empty());
    assert_eq!(reports[1].repository, "svc-y");
    assert!(!reports[1].is_failure());
    assert_eq!(
        reports[1].branches,
        vec![BranchReport::new(
            "master",
            BranchOutcome::AppliedDefaultProtection
        )]
    );

    let summary = RunSummary::from_reports(&reports);
    assert_eq!(summary.failed_repositories, 1);
    assert_eq!(summary.applied, 1);
}

#[tokio::test]
async fn test_ignored_repository_is_skipped_even_when_named() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("legacy-app", "master");

    let reports = reconciler(&fake, "legacy-app")
        .reconcile_all(&["legacy-app".to_string()])
        .await
        .unwrap();

    assert_eq!(reports, vec![RepositoryReport::completed("legacy-app", vec![])]);
    assert!(fake.requests().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_reconcile_all_logs_each_report() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(true));

    reconciler(&fake, "")
        .reconcile_all(&["svc-a".to_string()])
        .await
        .unwrap();

    assert!(logs_contain(
        r#"svc-a {"repository":"svc-a","branches":[{"branch":"develop","outcome":"relaxed_strict_status_checks"}]}"#
    ));
}

#[tokio::test]
async fn test_get_branch_protection_decodes_state() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(true));

    let state = reconciler(&fake, "")
        .get_branch_protection("svc-a", "develop")
        .await
        .unwrap();

    assert!(state.has_strict_status_checks());
    assert!(state.restrictions.is_absent());
}

#[tokio::test]
async fn test_apply_default_protection_without_definition_is_fatal() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_branch("svc-a", "feature-x");

    let err = reconciler(&fake, "")
        .apply_default_protection("svc-a", "feature-x")
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        WatcherError::MissingProtectionDefinition { branch } if branch == "feature-x"
    ));
    assert!(err.is_fatal());
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_relax_strict_status_checks_sends_flag() {
    let fake = Arc::new(FakeGitHub::new("acme"));
    fake.add_protected_branch("svc-a", "develop", strict_develop_protection(false));

    reconciler(&fake, "")
        .relax_strict_status_checks("svc-a", "develop", true)
        .await
        .unwrap();

    assert_eq!(fake.writes()[0].body, Some(json!({ "strict": true })));
    assert_eq!(
        fake.protection("svc-a", "develop").unwrap()["required_status_checks"]["strict"],
        true
    );
}

#[tokio::test]
async fn test_watch_team_write_permissions_is_not_implemented() {
    let fake = Arc::new(FakeGitHub::new("acme"));

    let err = reconciler(&fake, "")
        .watch_team_write_permissions("svc-a")
        .await
        .unwrap_err();

    assert!(matches!(err, WatcherError::NotImplemented { .. }));
    assert!(err.is_fatal());
    assert!(fake.requests().is_empty());
}
