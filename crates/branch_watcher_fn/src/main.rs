//! Branch Watcher custom handler
//!
//! Binary started by the Azure Functions host.
//!
//! # Environment Variables
//!
//! - `FUNCTIONS_CUSTOMHANDLER_PORT`: Port to listen on (default: 8080)
//! - `BRANCH_WATCHER_FUNCTION_NAME`: Function name (default: branch_protection_timer)
//! - `RUST_LOG`: Log filter (default: info)
//! - `GH_*`: Branch protection policy, see `config_manager::environment`

use branch_watcher_core::Reconciler;
use branch_watcher_fn::{AppState, FunctionServer, HandlerConfig};
use config_manager::{PolicyStore, ProcessEnvironment};
use github_client::{create_token_client, OctocrabTransport, PaginatedClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HandlerConfig::from_source(&ProcessEnvironment)?;
    let policy = Arc::new(PolicyStore::from_env()?);

    let api = policy.api();
    let octocrab = create_token_client(&api.base_url, &api.accept, &api.token)?;
    let client = PaginatedClient::new(Arc::new(OctocrabTransport::new(octocrab)))
        .with_max_pages(api.max_pages);

    let state = AppState::new(Reconciler::new(client, policy));
    let server = FunctionServer::new(config, state);

    tracing::info!("Starting Branch Watcher custom handler");

    server.serve().await
}
