//! Cycle runner: discover, schedule, collect, persist, clean up, repeat

use crate::coordination::scheduler::{HarvestScheduler, OutcomeKind, TaskReport};
use crate::coordination::QuotaGuard;
use crate::discovery;
use crate::error::{Error, Result};
use crate::fetch::ArtifactFetcher;
use crate::output::FindingsReport;
use crate::patterns::ExtensionFilter;
use crate::provision;
use crate::scratch::ScratchRoot;
use crate::traits::{Analyzer, GitHubApi};
use crate::types::{HarvestConfig, WorkItem};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Phases of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Fetch the feed and extract work items
    Discover,
    /// Dispatch work items to the pool
    Schedule,
    /// Wait for every dispatched task
    Collect,
    /// Write the findings report
    Persist,
    /// Remove the scratch root
    Cleanup,
    /// Sleeping until the next pass
    Idle,
}

/// Counts from one completed pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Work items found in the feed
    pub discovered: usize,
    /// Items the analyzer reported something for
    pub with_findings: usize,
    /// Items scanned with nothing to report
    pub clean: usize,
    /// Items that produced no finding
    pub failed: usize,
}

impl CycleSummary {
    fn from_reports(discovered: usize, reports: &[TaskReport]) -> Self {
        let mut summary = Self {
            discovered,
            ..Default::default()
        };
        for report in reports {
            match report.kind() {
                OutcomeKind::Findings => summary.with_findings += 1,
                OutcomeKind::Clean => summary.clean += 1,
                OutcomeKind::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Drives repeated harvesting passes
pub struct CycleRunner<A, S> {
    api: Arc<A>,
    analyzer: Arc<S>,
    quota: Arc<QuotaGuard<A>>,
    scheduler: HarvestScheduler<A, S>,
    scratch: ScratchRoot,
    config: HarvestConfig,
}

impl<A: GitHubApi, S: Analyzer> CycleRunner<A, S> {
    /// Wire the pipeline together
    pub fn new(api: Arc<A>, analyzer: Arc<S>, config: HarvestConfig) -> Result<Self> {
        config.validate()?;

        let filter = ExtensionFilter::new(&config.extra_denied_extensions)?;
        let quota = Arc::new(QuotaGuard::new(Arc::clone(&api)));
        let fetcher = ArtifactFetcher::new(Arc::clone(&api), Arc::clone(&quota), filter);
        let scratch = ScratchRoot::new(&config.scratch_root);
        let scheduler = HarvestScheduler::new(
            Arc::clone(&analyzer),
            fetcher,
            scratch.clone(),
            config.mode,
            config.max_workers,
        );

        Ok(Self {
            api,
            analyzer,
            quota,
            scheduler,
            scratch,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run passes until interrupted, or once when configured single-shot.
    ///
    /// Returns `Ok` on interrupt; the first cycle-level error ends the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        provision::prepare(&self.config, self.analyzer.as_ref())?;

        loop {
            if *shutdown.borrow() {
                info!("Process interrupted by user.");
                return Ok(());
            }

            let summary = self.run_once(&shutdown).await?;
            info!(
                discovered = summary.discovered,
                findings = summary.with_findings,
                clean = summary.clean,
                failed = summary.failed,
                "cycle complete"
            );

            if self.config.once {
                return Ok(());
            }
            if *shutdown.borrow() {
                info!("Process interrupted by user.");
                return Ok(());
            }

            debug!(phase = ?CyclePhase::Idle, seconds = self.config.interval.as_secs_f64(), "sleeping");
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                changed = shutdown.changed() => {
                    // A dropped sender also means stop
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Process interrupted by user.");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One full pass. The scratch root is removed even when the pass fails.
    ///
    /// Shutdown while discovery waits on the quota ends the pass early with
    /// an empty summary and leaves the previous report in place.
    pub async fn run_once(&self, shutdown: &watch::Receiver<bool>) -> Result<CycleSummary> {
        let result = self.harvest(shutdown).await;

        debug!(phase = ?CyclePhase::Cleanup, "removing scratch root");
        if let Err(e) = self.scratch.purge() {
            warn!(path = %self.scratch.path().display(), error = %e, "failed to remove scratch root");
        }

        result
    }

    async fn harvest(&self, shutdown: &watch::Receiver<bool>) -> Result<CycleSummary> {
        debug!(phase = ?CyclePhase::Discover);
        let items = match self.discover(shutdown).await {
            Ok(items) => items,
            Err(Error::Interrupted) => {
                info!("Interrupted before discovery completed");
                return Ok(CycleSummary::default());
            }
            Err(e) => return Err(e),
        };
        info!("Discovered {} commits", items.len());

        self.scratch.ensure()?;
        debug!(phase = ?CyclePhase::Schedule, workers = self.scheduler.max_workers());
        let discovered = items.len();
        let reports = self.scheduler.run(items, shutdown).await;
        debug!(phase = ?CyclePhase::Collect, reports = reports.len());

        debug!(phase = ?CyclePhase::Persist, path = %self.config.findings_path.display());
        FindingsReport::from_reports(&reports).write_to(&self.config.findings_path)?;

        Ok(CycleSummary::from_reports(discovered, &reports))
    }

    async fn discover(&self, shutdown: &watch::Receiver<bool>) -> Result<Vec<WorkItem>> {
        self.quota.check_and_wait(shutdown).await?;
        let feed = self.api.feed().await?;
        Ok(discovery::discover(&feed))
    }
}
