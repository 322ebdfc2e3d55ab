//! HTTP routing configuration
//!
//! - POST /{function} - Run branch protection reconciliation
//! - GET  /health     - Health check

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::{handlers, AppState};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

/// Create the router for the custom handler.
///
/// The Functions host posts invocations to a path named after the function.
pub fn create_router(state: AppState, function_name: &str) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new())
        .on_response(DefaultOnResponse::new());

    Router::new()
        .route(
            &format!("/{}", function_name.trim_start_matches('/')),
            post(handlers::run_branch_protection),
        )
        .route("/health", get(handlers::health_check))
        .layer(trace_layer)
        .with_state(state)
}
