//! HTTP server configuration and startup

use anyhow::Context;
use axum::Router;
use config_manager::{environment::optional, VariableSource};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;

use crate::{routes, AppState, DEFAULT_FUNCTION_NAME, DEFAULT_PORT};

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;

/// Port the Functions host expects the custom handler on.
pub const PORT_VARIABLE: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Overrides the name of the function the invocations are posted to.
pub const FUNCTION_NAME_VARIABLE: &str = "BRANCH_WATCHER_FUNCTION_NAME";

/// Custom handler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Function name, used as the invocation path
    pub function_name: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_string(),
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
        }
    }
}

impl HandlerConfig {
    /// Reads the configuration from the given variables, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is not a valid port number.
    pub fn from_source(source: &impl VariableSource) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(port) = optional(source, PORT_VARIABLE) {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid {}: '{}'", PORT_VARIABLE, port))?;
        }
        if let Some(function_name) = optional(source, FUNCTION_NAME_VARIABLE) {
            config.function_name = function_name;
        }

        Ok(config)
    }
}

/// Custom handler server
pub struct FunctionServer {
    config: HandlerConfig,
    state: AppState,
}

impl FunctionServer {
    pub fn new(config: HandlerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the Axum router with all routes and middleware.
    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone(), &self.config.function_name)
    }

    /// Start the server and listen for invocations.
    ///
    /// This method blocks until the server is shut down gracefully via
    /// CTRL+C (SIGINT) or SIGTERM signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from((
            self.config.host.parse::<std::net::IpAddr>()?,
            self.config.port,
        ));

        tracing::info!(
            function = self.config.function_name.as_str(),
            "Starting custom handler on {}",
            addr
        );

        let listener = TcpListener::bind(addr).await?;
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Wait for shutdown signal (CTRL+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
