//! Bounded-concurrency harvest scheduler
//!
//! Every work item becomes one Tokio task. Tasks acquire a semaphore permit
//! before doing anything else, so at most `max_workers` are ever past that
//! point, and a scratch space is only allocated while a permit is held.
//! Each task resolves to a [`TaskReport`]; errors never cross the task
//! boundary and a failed item never affects its siblings.

use crate::error::Error;
use crate::fetch::ArtifactFetcher;
use crate::scratch::ScratchRoot;
use crate::traits::{Analyzer, GitHubApi};
use crate::types::{Finding, ScanMode, WorkItem};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};

/// Why a work item produced no finding
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Scratch directory could not be created
    #[error("scratch allocation failed: {0}")]
    Scratch(#[source] std::io::Error),

    /// Quota probe, commit metadata or a file download failed
    #[error("fetch failed: {0}")]
    Fetch(#[source] Error),

    /// Analyzer failed or could not be started
    #[error("scan failed: {0}")]
    Scan(#[source] Error),

    /// Interrupted before dispatch or while waiting on the quota
    #[error("cancelled by shutdown")]
    Cancelled,

    /// Task panicked or was torn down by the runtime
    #[error("task aborted: {0}")]
    Aborted(String),
}

/// Terminal outcome of one work item
#[derive(Debug)]
pub struct TaskReport {
    /// The item processed
    pub item: WorkItem,
    /// Finding on success, the reason otherwise
    pub result: Result<Finding, TaskError>,
}

/// Coarse outcome classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Analyzer reported something
    Findings,
    /// Analyzer ran and reported nothing
    Clean,
    /// No finding was produced
    Failed,
}

impl TaskReport {
    /// Classify the outcome
    pub fn kind(&self) -> OutcomeKind {
        match &self.result {
            Ok(f) if f.has_findings() => OutcomeKind::Findings,
            Ok(_) => OutcomeKind::Clean,
            Err(_) => OutcomeKind::Failed,
        }
    }
}

struct Shared<A, S> {
    analyzer: Arc<S>,
    fetcher: ArtifactFetcher<A>,
    scratch: ScratchRoot,
    mode: ScanMode,
    permits: Semaphore,
}

/// Fans work items out over a fixed-size worker pool
pub struct HarvestScheduler<A, S> {
    shared: Arc<Shared<A, S>>,
    max_workers: usize,
}

impl<A: GitHubApi, S: Analyzer> HarvestScheduler<A, S> {
    /// Create a scheduler with `max_workers` concurrent tasks (minimum 1)
    pub fn new(
        analyzer: Arc<S>,
        fetcher: ArtifactFetcher<A>,
        scratch: ScratchRoot,
        mode: ScanMode,
        max_workers: usize,
    ) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            shared: Arc::new(Shared {
                analyzer,
                fetcher,
                scratch,
                mode,
                permits: Semaphore::new(max_workers),
            }),
            max_workers,
        }
    }

    /// Worker pool size
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Process every item and wait for all of them.
    ///
    /// Returns exactly one report per input item, in completion order.
    /// Once `shutdown` flips to `true`, items that have not yet started are
    /// reported as [`TaskError::Cancelled`]; items already running finish,
    /// except those parked on an exhausted quota, which are cancelled too.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        shutdown: &watch::Receiver<bool>,
    ) -> Vec<TaskReport> {
        let mut reports = Vec::with_capacity(items.len());
        let mut in_flight = FuturesUnordered::new();

        for item in items {
            if *shutdown.borrow() {
                reports.push(TaskReport {
                    item,
                    result: Err(TaskError::Cancelled),
                });
                continue;
            }

            info!("Processing repository: {} commit: {}", item.full_name(), item.commit_id);
            let shared = Arc::clone(&self.shared);
            let task_item = item.clone();
            let shutdown = shutdown.clone();
            let handle =
                tokio::spawn(async move { shared.process(task_item, shutdown).await });

            in_flight.push(async move {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(TaskError::Aborted(e.to_string())),
                };
                TaskReport { item, result }
            });
        }

        while let Some(report) = in_flight.next().await {
            log_outcome(&report);
            reports.push(report);
        }

        reports
    }
}

impl<A: GitHubApi, S: Analyzer> Shared<A, S> {
    async fn process(
        &self,
        item: WorkItem,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Finding, TaskError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TaskError::Aborted(e.to_string()))?;

        // Waiting for a permit counts as not yet dispatched
        if *shutdown.borrow() {
            return Err(TaskError::Cancelled);
        }

        match self.mode {
            ScanMode::Local => self.process_local(&item, &shutdown).await,
            ScanMode::Remote => self.process_remote(&item).await,
        }
    }

    async fn process_local(
        &self,
        item: &WorkItem,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<Finding, TaskError> {
        let scratch = self.scratch.allocate(item).map_err(TaskError::Scratch)?;

        let result = async {
            let summary = self
                .fetcher
                .fetch(item, scratch.path(), shutdown)
                .await
                .map_err(|e| match e {
                    Error::Interrupted => TaskError::Cancelled,
                    e => TaskError::Fetch(e),
                })?;
            info!(
                "Downloaded commit {} of {} to {} ({} files, {} skipped)",
                item.commit_id,
                item.full_name(),
                scratch.path().display(),
                summary.written,
                summary.skipped
            );

            let raw = self
                .analyzer
                .scan_local(scratch.path())
                .await
                .map_err(TaskError::Scan)?;
            Ok(Finding::from_scan(item, raw))
        }
        .await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %e, "failed to remove scratch space");
        }

        result
    }

    async fn process_remote(&self, item: &WorkItem) -> Result<Finding, TaskError> {
        let raw = self
            .analyzer
            .scan_remote(&item.clone_url())
            .await
            .map_err(TaskError::Scan)?;
        Ok(Finding::from_scan(item, raw))
    }
}

fn log_outcome(report: &TaskReport) {
    match &report.result {
        Ok(Finding {
            raw_output: Some(raw),
            ..
        }) => info!("[*] Findings for {}:\n{}", report.item, raw),
        Ok(_) => info!("[-] No findings for {}.", report.item),
        Err(TaskError::Cancelled) => info!("Skipped {}: {}", report.item, TaskError::Cancelled),
        Err(e) => warn!("Error processing {}: {}", report.item, e),
    }
}
