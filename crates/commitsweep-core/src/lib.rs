//! # Commitsweep Core
//!
//! Harvests recently referenced commits from GitHub's public activity feed
//! and runs an external secret analyzer over them.
//!
//! The pipeline per cycle:
//! - **Discover**: fetch the timeline and extract `(owner, repo, sha)` items
//! - **Schedule**: fan items out over a bounded worker pool, each task
//!   gated by a shared [`coordination::QuotaGuard`]
//! - **Collect**: every item ends as a [`coordination::TaskReport`]
//! - **Persist**: overwrite the findings report
//! - **Cleanup**: remove the scratch root
//!
//! ## Example
//!
//! ```no_run
//! use commitsweep_core::{CycleRunner, GitHubClient, HarvestConfig, ScanMode, TruffleHog};
//! use std::sync::Arc;
//!
//! # async fn example() -> commitsweep_core::Result<()> {
//! let config = HarvestConfig {
//!     once: true,
//!     mode: ScanMode::Local,
//!     ..Default::default()
//! };
//! let api = Arc::new(GitHubClient::new(
//!     config.api_base.clone(),
//!     config.feed_url.clone(),
//!     config.token.clone(),
//! ));
//! let analyzer = Arc::new(TruffleHog::new(
//!     config.analyzer_path.clone(),
//!     config.rules_path.clone(),
//!     config.token.clone(),
//! ));
//!
//! let (_stop, shutdown) = tokio::sync::watch::channel(false);
//! CycleRunner::new(api, analyzer, config)?.run(shutdown).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod coordination;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod http;
pub mod output;
pub mod patterns;
pub mod platform;
pub mod provision;
pub mod scan;
pub mod scratch;
pub mod traits;
pub mod types;

pub use coordination::{CycleRunner, CycleSummary, HarvestScheduler, QuotaGuard, TaskError, TaskReport};
pub use discovery::discover;
pub use error::{Error, ErrorKind, Result};
pub use http::GitHubClient;
pub use scan::TruffleHog;
pub use traits::{Analyzer, GitHubApi};
pub use types::{CommitFile, Finding, HarvestConfig, QuotaState, ScanMode, WorkItem};
