//! In-process fakes for the GitHub API and the analyzer

#![allow(dead_code)]

use commitsweep_core::coordination::quota::unix_now;
use commitsweep_core::{Analyzer, CommitFile, Error, GitHubApi, QuotaState, Result, WorkItem};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted GitHub API
#[derive(Default)]
pub struct FakeGitHub {
    pub feed_body: Mutex<Option<String>>,
    pub feed_fails: bool,
    pub quota_fails: bool,
    /// Every probe reports zero remaining with a reset an hour out
    pub quota_exhausted: bool,
    /// commit id -> changed files
    pub commits: Mutex<HashMap<String, Vec<CommitFile>>>,
    /// commit ids whose metadata call fails
    pub broken_commits: HashSet<String>,
    /// raw urls whose download fails
    pub broken_downloads: HashSet<String>,
    pub downloads: Mutex<Vec<String>>,
    pub quota_probes: AtomicUsize,
}

impl FakeGitHub {
    pub fn with_feed(body: &str) -> Self {
        Self {
            feed_body: Mutex::new(Some(body.to_string())),
            ..Default::default()
        }
    }

    pub fn add_commit(&self, sha: &str, files: &[&str]) {
        let files = files
            .iter()
            .map(|name| CommitFile {
                filename: name.to_string(),
                raw_url: Some(raw_url(sha, name)),
            })
            .collect();
        self.commits.lock().insert(sha.to_string(), files);
    }
}

pub fn raw_url(sha: &str, name: &str) -> String {
    format!("https://raw.example/{}/{}", sha, name)
}

/// Feed body linking each `(owner, repo, sha)` once
pub fn feed_for(items: &[(&str, &str, &str)]) -> String {
    items
        .iter()
        .map(|(o, r, s)| format!("<a href=\"/{}/{}/commit/{}\">{}</a>\n", o, r, s, s))
        .collect()
}

impl GitHubApi for FakeGitHub {
    async fn rate_limit(&self) -> Result<QuotaState> {
        self.quota_probes.fetch_add(1, Ordering::SeqCst);
        if self.quota_fails {
            return Err(Error::Retrieval("rate limit returned 500".to_string()));
        }
        if self.quota_exhausted {
            return Ok(QuotaState {
                remaining: 0,
                reset_at: unix_now() + 3600,
            });
        }
        Ok(QuotaState {
            remaining: 4999,
            reset_at: 0,
        })
    }

    async fn feed(&self) -> Result<String> {
        if self.feed_fails {
            return Err(Error::Retrieval("activity feed returned 503".to_string()));
        }
        Ok(self.feed_body.lock().clone().unwrap_or_default())
    }

    async fn commit_files(&self, item: &WorkItem) -> Result<Vec<CommitFile>> {
        if self.broken_commits.contains(&item.commit_id) {
            return Err(Error::Retrieval(format!(
                "commit metadata returned 404 for {}",
                item
            )));
        }
        Ok(self
            .commits
            .lock()
            .get(&item.commit_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download(&self, raw_url: &str) -> Result<Vec<u8>> {
        self.downloads.lock().push(raw_url.to_string());
        if self.broken_downloads.contains(raw_url) {
            return Err(Error::Retrieval("raw file returned 500".to_string()));
        }
        Ok(format!("contents of {}\n", raw_url).into_bytes())
    }
}

/// Analyzer that records what it saw
pub struct FakeAnalyzer {
    /// Scratch root whose population is sampled on every local scan
    pub scratch_root: Option<PathBuf>,
    /// repo name -> output
    pub outputs: HashMap<String, String>,
    /// repo names whose scan fails
    pub failing: HashSet<String>,
    pub delay: Duration,
    pub local_scans: Mutex<Vec<(PathBuf, Vec<String>)>>,
    pub remote_scans: Mutex<Vec<String>>,
    pub max_live_scratch: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl Default for FakeAnalyzer {
    fn default() -> Self {
        Self {
            scratch_root: None,
            outputs: HashMap::new(),
            failing: HashSet::new(),
            delay: Duration::from_millis(0),
            local_scans: Mutex::new(Vec::new()),
            remote_scans: Mutex::new(Vec::new()),
            max_live_scratch: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl FakeAnalyzer {
    fn output_for(&self, key: &str) -> Result<String> {
        let hit = |set_key: &String| key.contains(set_key.as_str());
        if self.failing.iter().any(hit) {
            return Err(Error::Scan("analyzer exited with exit status: 1".to_string()));
        }
        Ok(self
            .outputs
            .iter()
            .find(|(k, _)| key.contains(k.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_default())
    }

    async fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(ref root) = self.scratch_root {
            let live = std::fs::read_dir(root)
                .map(|entries| entries.filter_map(|e| e.ok()).count())
                .unwrap_or(0);
            self.max_live_scratch.fetch_max(live, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Analyzer for FakeAnalyzer {
    async fn scan_local(&self, path: &Path) -> Result<String> {
        self.enter().await;
        let mut names: Vec<String> = std::fs::read_dir(path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        self.local_scans.lock().push((path.to_path_buf(), names));

        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = self.output_for(&key);
        self.leave();
        result
    }

    async fn scan_remote(&self, repo_url: &str) -> Result<String> {
        self.enter().await;
        self.remote_scans.lock().push(repo_url.to_string());
        let result = self.output_for(repo_url);
        self.leave();
        result
    }
}
