//! Tests for errors module

use super::*;
use config_manager::ConfigurationError;

#[test]
fn test_invalid_request_maps_to_bad_request() {
    let error = FunctionError::InvalidRequest("repositories must be a list".to_string());

    let body = ErrorResponse::from(&error);

    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(body.error.code, "InvalidRequest");
    assert!(body.error.message.contains("repositories must be a list"));
}

#[test]
fn test_discovery_failure_maps_to_internal_error() {
    let error = FunctionError::from(WatcherError::GitHub(github_client::Error::NotFound {
        path: "/orgs/acme/repos".to_string(),
    }));

    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ErrorResponse::from(&error).error.code, "ReconciliationError");
}

#[test]
fn test_fatal_error_code() {
    let error = FunctionError::from(WatcherError::Configuration(
        ConfigurationError::RequiredConfigMissing {
            key: "GH_ORGANIZATION_NAME".to_string(),
        },
    ));

    assert_eq!(ErrorResponse::from(&error).error.code, "ConfigurationError");
}

#[test]
fn test_into_response_status() {
    let response = FunctionError::InvalidRequest("bad".to_string()).into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
