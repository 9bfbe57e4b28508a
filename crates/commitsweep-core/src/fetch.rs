//! Artifact fetcher: pulls a commit's changed text files into scratch space

use crate::coordination::QuotaGuard;
use crate::error::{Error, Result};
use crate::patterns::ExtensionFilter;
use crate::platform::PathUtil;
use crate::traits::GitHubApi;
use crate::types::WorkItem;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// What a fetch wrote and skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Files written to the scratch directory
    pub written: usize,
    /// Files skipped by extension or for lacking a content URL
    pub skipped: usize,
}

/// Downloads changed files for one work item
pub struct ArtifactFetcher<A> {
    api: Arc<A>,
    quota: Arc<QuotaGuard<A>>,
    filter: ExtensionFilter,
}

impl<A: GitHubApi> ArtifactFetcher<A> {
    /// Create a new fetcher
    pub fn new(api: Arc<A>, quota: Arc<QuotaGuard<A>>, filter: ExtensionFilter) -> Self {
        Self { api, quota, filter }
    }

    /// Write every non-denied changed file of `item` into `dest`.
    ///
    /// Fails fast: the first download error aborts the whole fetch.
    /// Raw downloads share the metadata call's quota pool and are not
    /// individually gated. Shutdown during a quota wait yields
    /// [`Error::Interrupted`].
    pub async fn fetch(
        &self,
        item: &WorkItem,
        dest: &Path,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<FetchSummary> {
        self.quota.check_and_wait(shutdown).await?;

        let files = self.api.commit_files(item).await?;
        let mut summary = FetchSummary::default();

        for file in files {
            if self.filter.is_denied(&file.filename) {
                debug!(file = %file.filename, commit = %item.commit_id, "skipping binary/media file");
                summary.skipped += 1;
                continue;
            }

            let (Some(raw_url), Some(name)) =
                (file.raw_url.as_deref(), PathUtil::base_name(&file.filename))
            else {
                debug!(file = %file.filename, "no downloadable content");
                summary.skipped += 1;
                continue;
            };

            let bytes = self.api.download(raw_url).await.map_err(|e| {
                Error::Retrieval(format!("{} ({}): {}", file.filename, item, e.message()))
            })?;
            tokio::fs::write(dest.join(name), bytes).await?;
            summary.written += 1;
        }

        Ok(summary)
    }
}
