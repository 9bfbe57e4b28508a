//! TruffleHog subprocess adapter

use crate::error::{Error, Result};
use crate::platform::{self, PathUtil};
use crate::traits::Analyzer;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest stderr excerpt carried in a [`Error::Scan`]
const MAX_STDERR_CHARS: usize = 2000;

/// Variable the `github` source reads its token from
const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Invokes the TruffleHog binary in filesystem or GitHub mode
pub struct TruffleHog {
    binary: PathBuf,
    rules: Option<PathBuf>,
    token: Option<String>,
}

impl std::fmt::Debug for TruffleHog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TruffleHog")
            .field("binary", &self.binary)
            .field("rules", &self.rules)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TruffleHog {
    /// Create an adapter. `rules` is dropped when the file does not exist.
    pub fn new(binary: PathBuf, rules: PathBuf, token: Option<String>) -> Self {
        let rules = if rules.is_file() {
            Some(rules)
        } else {
            warn!(path = %rules.display(), "rule config not found, scanning with built-in detectors");
            None
        };
        Self {
            binary,
            rules,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn common_args(&self, args: &mut Vec<OsString>) {
        args.push("--results=verified".into());
        args.push("--json".into());
        args.push("--no-update".into());
        if let Some(ref rules) = self.rules {
            args.push("--config".into());
            args.push(rules.as_os_str().to_owned());
        }
    }

    /// Arguments for a filesystem scan
    pub fn local_args(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["filesystem".into()];
        self.common_args(&mut args);
        args.push(path.as_os_str().to_owned());
        args
    }

    /// Arguments for a remote repository scan. The token travels in the
    /// child's environment, never on its command line.
    pub fn remote_args(&self, repo_url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["github".into(), "--repo".into(), repo_url.into()];
        self.common_args(&mut args);
        args
    }

    fn command(&self, args: Vec<OsString>, with_token: bool) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        match self.token {
            Some(ref token) if with_token => {
                cmd.env(TOKEN_ENV, token);
            }
            // Never inherit an ambient token into filesystem scans
            _ => {
                cmd.env_remove(TOKEN_ENV);
            }
        }
        cmd
    }

    async fn run(&self, mut cmd: Command, target: &str) -> Result<String> {
        debug!(binary = %self.binary.display(), target, "invoking analyzer");

        let output = cmd
            .output()
            .await
            .map_err(|e| {
                Error::Scan(format!(
                    "failed to start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(Error::Scan(format!(
                "analyzer exited with {} scanning {}: {}",
                output.status, target, excerpt
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Analyzer for TruffleHog {
    async fn scan_local(&self, path: &Path) -> Result<String> {
        let target = path.display().to_string();
        self.run(self.command(self.local_args(path), false), &target)
            .await
    }

    async fn scan_remote(&self, repo_url: &str) -> Result<String> {
        self.run(self.command(self.remote_args(repo_url), true), repo_url)
            .await
    }

    fn ensure_available(&self) -> Result<()> {
        let name = self.binary.to_string_lossy();
        // Bare names resolve through PATH at spawn time
        if !PathUtil::has_separator(&name) {
            return Ok(());
        }
        if self.binary.is_file() {
            return Ok(());
        }

        let asset = platform::release_target()
            .map(|t| format!(" (release asset: trufflehog_<version>_{}.tar.gz)", t))
            .unwrap_or_default();
        Err(Error::Provision(format!(
            "analyzer binary not found at {}{}",
            self.binary.display(),
            asset
        )))
    }
}
