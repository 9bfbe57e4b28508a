//! Core type definitions

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One discovered repository + commit pair awaiting processing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    /// Repository owner (user or organisation)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Commit SHA as it appeared in the feed
    pub commit_id: String,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        commit_id: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            commit_id: commit_id.into(),
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Clone URL used by remote-mode scans
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }

    /// First seven characters of the commit id
    #[inline]
    pub fn short_sha(&self) -> &str {
        let end = self
            .commit_id
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.commit_id.len());
        &self.commit_id[..end]
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} commit {}", self.owner, self.repo, self.commit_id)
    }
}

/// Remaining API budget and when it refills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Calls left in the current window
    pub remaining: u64,
    /// Unix timestamp (seconds) at which the window resets
    pub reset_at: i64,
}

impl QuotaState {
    /// True when no calls are left
    #[inline]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// A changed file entry from the commit metadata API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitFile {
    /// Repository-relative path
    pub filename: String,
    /// Direct content URL; absent for submodule bumps and some renames
    #[serde(default)]
    pub raw_url: Option<String>,
}

/// Recorded outcome of scanning one work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// `owner/repo`
    pub source_repo: String,
    /// Commit SHA
    pub commit_id: String,
    /// Analyzer output; `None` when the analyzer reported nothing
    pub raw_output: Option<String>,
}

impl Finding {
    /// Build a finding from raw analyzer output.
    ///
    /// Whitespace-only output means "no findings".
    pub fn from_scan(item: &WorkItem, raw: String) -> Self {
        let raw_output = if raw.trim().is_empty() {
            None
        } else {
            Some(raw)
        };
        Self {
            source_repo: item.full_name(),
            commit_id: item.commit_id.clone(),
            raw_output,
        }
    }

    /// True when the analyzer reported something
    #[inline]
    pub fn has_findings(&self) -> bool {
        self.raw_output.is_some()
    }
}

/// Where the analyzer looks for secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Download the commit's changed files and scan them on disk
    Local,
    /// Point the analyzer at the remote repository
    #[default]
    Remote,
}

impl ScanMode {
    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Run-time configuration for the harvester
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Pause between cycles
    pub interval: Duration,
    /// Run a single cycle and stop
    pub once: bool,
    /// Worker pool size
    pub max_workers: usize,
    /// Local download or remote repository scanning
    pub mode: ScanMode,
    /// Parent of every per-item scratch directory
    pub scratch_root: PathBuf,
    /// Findings report, overwritten each cycle
    pub findings_path: PathBuf,
    /// Analyzer executable
    pub analyzer_path: PathBuf,
    /// Analyzer rule configuration
    pub rules_path: PathBuf,
    /// GitHub REST API base URL
    pub api_base: String,
    /// Public activity feed
    pub feed_url: String,
    /// API token
    pub token: Option<String>,
    /// Additional extensions to skip on download
    pub extra_denied_extensions: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            once: false,
            max_workers: 5,
            mode: ScanMode::default(),
            scratch_root: PathBuf::from("tmp"),
            findings_path: PathBuf::from("findings.txt"),
            analyzer_path: crate::platform::default_analyzer_path(),
            rules_path: PathBuf::from("config").join("generic_with_filters.yml"),
            api_base: "https://api.github.com".to_string(),
            feed_url: "https://github.com/timeline".to_string(),
            token: None,
            extra_denied_extensions: Vec::new(),
        }
    }
}

impl HarvestConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_workers == 0 {
            return Err(crate::Error::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.api_base.trim().is_empty() {
            return Err(crate::Error::Config("api_base is empty".to_string()));
        }
        if self.feed_url.trim().is_empty() {
            return Err(crate::Error::Config("feed_url is empty".to_string()));
        }
        if !self.once && self.interval.is_zero() {
            return Err(crate::Error::Config(
                "interval must be non-zero unless running once".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_display() {
        let item = WorkItem::new("acme", "widgets", "abc123");
        assert_eq!(item.full_name(), "acme/widgets");
        assert_eq!(item.to_string(), "acme/widgets commit abc123");
        assert_eq!(item.clone_url(), "https://github.com/acme/widgets.git");
    }

    #[test]
    fn test_short_sha() {
        let item = WorkItem::new("a", "b", "0123456789abcdef");
        assert_eq!(item.short_sha(), "0123456");
        let short = WorkItem::new("a", "b", "abc");
        assert_eq!(short.short_sha(), "abc");
    }

    #[test]
    fn test_finding_whitespace_is_empty() {
        let item = WorkItem::new("acme", "widgets", "abc123");
        assert!(!Finding::from_scan(&item, String::new()).has_findings());
        assert!(!Finding::from_scan(&item, " \n\t ".to_string()).has_findings());

        let found = Finding::from_scan(&item, "{\"DetectorName\":\"AWS\"}\n".to_string());
        assert!(found.has_findings());
        assert_eq!(found.source_repo, "acme/widgets");
        assert_eq!(found.commit_id, "abc123");
    }

    #[test]
    fn test_commit_file_without_raw_url() {
        let file: CommitFile = serde_json::from_str(r#"{"filename":"vendor/lib"}"#).unwrap();
        assert_eq!(file.raw_url, None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = HarvestConfig::default();
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.mode, ScanMode::Remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_workers() {
        let config = HarvestConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_config_zero_interval_only_when_once() {
        let mut config = HarvestConfig {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.once = true;
        assert!(config.validate().is_ok());
    }
}
