//! Trait seams for the external collaborators
//!
//! Both traits return `impl Future + Send` so implementations can be plain
//! `async fn`s and the scheduler can move them onto worker tasks without
//! boxing.

use crate::error::Result;
use crate::types::{CommitFile, QuotaState, WorkItem};
use std::future::Future;
use std::path::Path;

/// GitHub endpoints the harvester consumes
pub trait GitHubApi: Send + Sync + 'static {
    /// Probe the remaining call budget (`GET /rate_limit`)
    fn rate_limit(&self) -> impl Future<Output = Result<QuotaState>> + Send;

    /// Fetch the public activity feed body
    fn feed(&self) -> impl Future<Output = Result<String>> + Send;

    /// Changed files of one commit (`GET /repos/{owner}/{repo}/commits/{sha}`)
    fn commit_files(&self, item: &WorkItem) -> impl Future<Output = Result<Vec<CommitFile>>> + Send;

    /// Raw bytes behind a `raw_url`
    fn download(&self, raw_url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Black-box secret analyzer
pub trait Analyzer: Send + Sync + 'static {
    /// Scan a directory on disk, returning raw findings text
    fn scan_local(&self, path: &Path) -> impl Future<Output = Result<String>> + Send;

    /// Scan a remote repository, returning raw findings text
    fn scan_remote(&self, repo_url: &str) -> impl Future<Output = Result<String>> + Send;

    /// Confirm the analyzer can be invoked. Called once before the first cycle.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}
