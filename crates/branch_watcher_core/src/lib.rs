//! # Branch Watcher Core
//!
//! Reconciles the branch protection of every repository in a GitHub organization with the
//! policy held by a [`config_manager::PolicyStore`].
//!
//! ## Overview
//!
//! A run consists of:
//! 1. Listing the organization repositories, minus the ignore list
//! 2. Listing the branches of each repository and keeping those the policy defines
//!    protection for
//! 3. Applying the default protection to unprotected branches
//! 4. Evaluating the drift rules against protected branches and applying their corrections
//!
//! Outcomes are collected per branch and per repository and can be folded into a
//! [`RunSummary`].
//!
//! ## Examples
//!
//! ```no_run
//! use branch_watcher_core::{Reconciler, RunSummary};
//! use config_manager::PolicyStore;
//! use github_client::{create_token_client, OctocrabTransport, PaginatedClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = Arc::new(PolicyStore::from_env()?);
//! let api = policy.api();
//! let octocrab = create_token_client(&api.base_url, &api.accept, &api.token)?;
//! let client = PaginatedClient::new(Arc::new(OctocrabTransport::new(octocrab)))
//!     .with_max_pages(api.max_pages);
//!
//! let reconciler = Reconciler::new(client, policy);
//! let repositories = reconciler.list_repositories().await?;
//! let reports = reconciler.reconcile_all(&repositories).await?;
//!
//! let summary = RunSummary::from_reports(&reports);
//! println!("applied: {}, relaxed: {}", summary.applied, summary.relaxed);
//! # Ok(())
//! # }
//! ```

pub mod drift;
pub use drift::{default_rules, Correction, DriftRule, StrictStatusChecksRule};

pub mod errors;
pub use errors::{WatcherError, WatcherResult};

pub mod outcome;
pub use outcome::{BranchOutcome, BranchReport, RepositoryReport, RunSummary};

pub mod reconciler;
pub use reconciler::Reconciler;
