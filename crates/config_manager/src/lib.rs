//! Configuration management for the branch protection watcher.
//!
//! This crate supplies the branch protection policy: the organization to watch, the
//! repositories to ignore, the desired protection per branch and the options used to
//! connect to the GitHub API. Everything is read from environment variables once at
//! startup; see [`environment`] for the variable names.

pub mod definitions;
pub mod environment;
pub mod errors;
pub mod policy;

// Re-export for convenient access
pub use environment::{ProcessEnvironment, VariableSource};
pub use errors::{ConfigurationError, ConfigurationResult};
pub use policy::{ApiConnection, PolicyStore};
