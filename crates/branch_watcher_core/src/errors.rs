//! Error types for branch protection reconciliation.

use config_manager::ConfigurationError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while reconciling branch protection.
///
/// Configuration and structural errors are fatal and abort the run. GitHub errors are
/// contained at the branch or repository they happened in.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A supported branch has no protection definition. The supported branch filter and the
    /// policy have drifted apart.
    #[error("No branch protection defined for {branch}")]
    MissingProtectionDefinition { branch: String },

    #[error("GitHub request failed: {0}")]
    GitHub(#[from] github_client::Error),

    #[error("Failed to encode request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The capability exists in the interface but has deliberately not been built yet.
    #[error("Not implemented: {capability}")]
    NotImplemented { capability: &'static str },
}

impl WatcherError {
    /// Returns true for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WatcherError::Configuration(_)
                | WatcherError::MissingProtectionDefinition { .. }
                | WatcherError::NotImplemented { .. }
        )
    }
}

/// Result type alias for reconciliation operations.
pub type WatcherResult<T> = Result<T, WatcherError>;
