//! Branch Watcher Azure Function
//!
//! This crate hosts the branch protection reconciliation as an Azure Functions custom
//! handler. The Functions host owns the timer trigger and forwards every invocation to this
//! process over HTTP.
//!
//! # Architecture
//!
//! This crate exists in the HTTP layer and handles:
//! - Decoding custom handler invocations
//! - Mapping reconciliation errors to HTTP responses
//! - Routing and server configuration
//!
//! The reconciliation itself lives in `branch_watcher_core`.

use branch_watcher_core::Reconciler;
use std::sync::Arc;

pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

// Re-export key types for convenience
pub use errors::{ErrorResponse, FunctionError};
pub use models::{InvocationRequest, InvocationResponse, RunRequest};
pub use server::{FunctionServer, HandlerConfig};

/// Default port when the Functions host does not provide one.
pub const DEFAULT_PORT: u16 = 8080;

/// Name of the timer triggered function in `function.json`.
pub const DEFAULT_FUNCTION_NAME: &str = "branch_protection_timer";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
        }
    }
}
