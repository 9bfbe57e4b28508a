#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use clap::Parser;
use commitsweep_core::{CycleRunner, GitHubClient, HarvestConfig, ScanMode, TruffleHog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "commitsweep",
    version,
    about = "Scan commits from GitHub's public timeline for verified secrets"
)]
struct Cli {
    /// Seconds between cycles
    #[arg(long, env = "COMMITSWEEP_INTERVAL", default_value_t = 5)]
    interval: u64,

    /// Run a single cycle and exit
    #[arg(long, env = "COMMITSWEEP_ONCE")]
    once: bool,

    /// Verbose output
    #[arg(long, env = "COMMITSWEEP_DEBUG")]
    debug: bool,

    /// Maximum concurrent workers
    #[arg(long, env = "COMMITSWEEP_MAX_WORKERS", default_value_t = 5)]
    max_workers: usize,

    /// Download changed files and scan locally instead of scanning remote repositories
    #[arg(long, env = "COMMITSWEEP_LOCAL_ONLY")]
    local_only: bool,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,

    /// Activity feed URL
    #[arg(long, env = "COMMITSWEEP_FEED_URL", default_value = "https://github.com/timeline")]
    feed_url: String,

    /// Scratch root for downloaded files (removed after every cycle)
    #[arg(long, env = "COMMITSWEEP_SCRATCH_DIR", default_value = "tmp")]
    scratch_dir: PathBuf,

    /// Findings report path, overwritten every cycle
    #[arg(long, env = "COMMITSWEEP_OUTPUT", default_value = "findings.txt")]
    output: PathBuf,

    /// Analyzer binary (default: binaries/trufflehog)
    #[arg(long, env = "COMMITSWEEP_ANALYZER")]
    analyzer: Option<PathBuf>,

    /// Analyzer rule configuration
    #[arg(
        long,
        env = "COMMITSWEEP_RULES",
        default_value = "config/generic_with_filters.yml"
    )]
    rules: PathBuf,

    /// Extra file extensions to skip when downloading (comma-separated)
    #[arg(long, env = "COMMITSWEEP_SKIP_EXTENSIONS", value_delimiter = ',')]
    skip_extensions: Vec<String>,
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

impl Cli {
    fn into_config(self) -> HarvestConfig {
        let defaults = HarvestConfig::default();
        HarvestConfig {
            interval: Duration::from_secs(self.interval),
            once: self.once,
            max_workers: self.max_workers,
            mode: if self.local_only {
                ScanMode::Local
            } else {
                ScanMode::Remote
            },
            scratch_root: self.scratch_dir,
            findings_path: self.output,
            analyzer_path: self.analyzer.unwrap_or(defaults.analyzer_path),
            rules_path: self.rules,
            api_base: self.api_url,
            feed_url: self.feed_url,
            token: clean_opt(self.token),
            extra_denied_extensions: self
                .skip_extensions
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let code = match run(cli.into_config()) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("An error occurred: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(config: HarvestConfig) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    rt.block_on(async {
        let api = Arc::new(GitHubClient::new(
            config.api_base.clone(),
            config.feed_url.clone(),
            config.token.clone(),
        ));
        let analyzer = Arc::new(TruffleHog::new(
            config.analyzer_path.clone(),
            config.rules_path.clone(),
            config.token.clone(),
        ));
        let runner = CycleRunner::new(api, analyzer, config).context("invalid configuration")?;

        let (stop, shutdown) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::info!("Interrupt received, finishing in-flight work (Ctrl-C again to exit now)");
            let _ = stop.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Second interrupt, exiting immediately");
                std::process::exit(0);
            }
        });

        runner.run(shutdown).await?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_config() {
        let cli = Cli::parse_from(["commitsweep"]);
        let config = cli.into_config();
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.mode, ScanMode::Remote);
        assert!(!config.once);
        assert!(config.extra_denied_extensions.is_empty());
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::parse_from([
            "commitsweep",
            "--once",
            "--local-only",
            "--max-workers",
            "3",
            "--interval",
            "60",
            "--skip-extensions",
            "iso,woff2",
            "--analyzer",
            "/opt/trufflehog",
        ]);
        let config = cli.into_config();
        assert!(config.once);
        assert_eq!(config.mode, ScanMode::Local);
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.extra_denied_extensions, vec!["iso", "woff2"]);
        assert_eq!(config.analyzer_path, PathBuf::from("/opt/trufflehog"));
    }

    #[test]
    fn test_empty_token_is_none() {
        assert_eq!(clean_opt(Some(String::new())), None);
        assert_eq!(clean_opt(Some("t".into())), Some("t".to_string()));
    }
}
