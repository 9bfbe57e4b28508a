//! Serialized access to the shared API quota
//!
//! Every quota-consuming step goes through [`QuotaGuard::check_and_wait`].
//! The probe and the wait happen under one async mutex, so once a caller
//! observes `remaining == 0` every other caller queues behind it until the
//! window has reset. The wait is abandoned as soon as shutdown is requested.

use crate::error::{Error, Result};
use crate::traits::GitHubApi;
use crate::types::QuotaState;
use parking_lot::Mutex as SyncMutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// How long to sleep so that we wake strictly after `reset_at`.
///
/// Never shorter than one second, even when `reset_at` is in the past.
#[inline]
pub fn wait_until_reset(reset_at: i64, now: i64) -> Duration {
    let secs = reset_at.saturating_sub(now).saturating_add(1).max(1);
    Duration::from_secs(secs as u64)
}

fn describe_reset(reset_at: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(reset_at, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| reset_at.to_string())
}

/// Quota guard shared by every worker task
pub struct QuotaGuard<A> {
    api: Arc<A>,
    gate: Mutex<()>,
    last: SyncMutex<Option<QuotaState>>,
}

impl<A: GitHubApi> QuotaGuard<A> {
    /// Create a new guard over the given API
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            gate: Mutex::new(()),
            last: SyncMutex::new(None),
        }
    }

    /// Probe the quota, blocking until it is non-zero.
    ///
    /// Returns the state that allowed the caller through, so
    /// `remaining >= 1` on success. Transport failures propagate
    /// unchanged; retry policy belongs to the caller. A shutdown request
    /// during the reset wait returns [`Error::Interrupted`].
    pub async fn check_and_wait(&self, shutdown: &watch::Receiver<bool>) -> Result<QuotaState> {
        let _gate = self.gate.lock().await;

        loop {
            let state = self.api.rate_limit().await?;
            *self.last.lock() = Some(state);

            if !state.is_exhausted() {
                debug!(remaining = state.remaining, "quota available");
                return Ok(state);
            }

            let wait = wait_until_reset(state.reset_at, unix_now());
            info!(
                "Rate limit exceeded. Sleeping for {} seconds (resets at {}).",
                wait.as_secs(),
                describe_reset(state.reset_at)
            );
            sleep_unless_shutdown(wait, shutdown.clone()).await?;
        }
    }

    /// Most recent state seen by any caller
    pub fn last_observed(&self) -> Option<QuotaState> {
        *self.last.lock()
    }
}

async fn sleep_unless_shutdown(wait: Duration, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    if *shutdown.borrow() {
        return Err(Error::Interrupted);
    }

    let sleep = tokio::time::sleep(wait);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Nobody left to interrupt us
                    (&mut sleep).await;
                    return Ok(());
                }
                if *shutdown.borrow() {
                    info!("Shutdown requested, abandoning quota wait");
                    return Err(Error::Interrupted);
                }
            }
        }
    }
}
