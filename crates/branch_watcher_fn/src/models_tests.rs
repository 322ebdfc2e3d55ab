//! Tests for models module

use super::*;
use serde_json::json;

#[test]
fn test_timer_invocation_has_no_run_options() {
    let request: InvocationRequest = serde_json::from_value(json!({
        "Data": {
            "timer": {
                "Schedule": { "AdjustForDST": true },
                "ScheduleStatus": null,
                "IsPastDue": false
            }
        },
        "Metadata": { "sys": { "MethodName": "branch_protection_timer" } }
    }))
    .unwrap();

    assert_eq!(request.run_request().unwrap(), RunRequest::default());
    assert_eq!(
        request.metadata["sys"]["MethodName"],
        "branch_protection_timer"
    );
}

#[test]
fn test_empty_invocation_defaults() {
    let request: InvocationRequest = serde_json::from_value(json!({})).unwrap();

    assert!(request.data.is_null());
    assert_eq!(request.run_request().unwrap(), RunRequest::default());
}

#[test]
fn test_repositories_option() {
    let request = InvocationRequest {
        data: json!({ "repositories": ["svc-a", "svc-b"] }),
        ..Default::default()
    };

    assert_eq!(
        request.run_request().unwrap().repositories,
        Some(vec!["svc-a".to_string(), "svc-b".to_string()])
    );
}

#[test]
fn test_malformed_repositories_option_is_rejected() {
    let request = InvocationRequest {
        data: json!({ "repositories": "svc-a" }),
        ..Default::default()
    };

    assert!(request.run_request().is_err());
}

#[test]
fn test_invocation_response_shape() {
    let response = InvocationResponse::new(RunSummary {
        repositories: 2,
        applied: 1,
        relaxed: 1,
        ..Default::default()
    });

    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["Outputs"], json!({}));
    assert_eq!(
        value["Logs"][0],
        "Reconciled 2 repositories: 1 protected, 1 relaxed, 0 unchanged, 0 failed branches, 0 failed repositories"
    );
    assert_eq!(value["ReturnValue"]["repositories"], 2);
    assert_eq!(value["ReturnValue"]["relaxed"], 1);
}
