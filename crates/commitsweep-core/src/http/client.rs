//! GitHub REST client for the feed, commit metadata, raw files and quota

use crate::error::{Error, Result};
use crate::traits::GitHubApi;
use crate::types::{CommitFile, QuotaState, WorkItem};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

/// API version pinned on every request
const API_VERSION: &str = "2022-11-28";

/// Upper bound on commit metadata pages (100 files each)
const MAX_COMMIT_PAGES: u32 = 30;

/// GitHub API response for `/rate_limit`
#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    rate: RateBucket,
}

#[derive(Debug, Deserialize)]
struct RateBucket {
    remaining: u64,
    reset: i64,
}

/// GitHub API response for commit details
#[derive(Debug, Deserialize)]
struct CommitDetails {
    #[serde(default)]
    files: Option<Vec<CommitFile>>,
}

/// GitHub client used by the harvester
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    api_origin: Option<Url>,
    feed_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("feed_url", &self.feed_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(api_base: String, feed_url: String, token: Option<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("commitsweep/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_base = api_base.trim_end_matches('/').to_string();
        Self {
            client,
            api_origin: Url::parse(&api_base).ok(),
            api_base,
            feed_url,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// API base URL without trailing slash
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Same scheme, host and port as the API base
    fn is_api_origin(&self, url: &str) -> bool {
        let (Some(api), Ok(url)) = (self.api_origin.as_ref(), Url::parse(url)) else {
            return false;
        };
        url.scheme() == api.scheme()
            && url.host_str() == api.host_str()
            && url.port_or_known_default() == api.port_or_known_default()
    }

    /// GET with the bearer token attached. Token only travels to the API host.
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match self.token {
            Some(ref token) if self.is_api_origin(url) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            _ => request,
        }
    }

    async fn send(&self, url: &str, what: &str) -> Result<Response> {
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Retrieval(format!("{} request failed: {}", what, e)))?;
        check_status(response, what)
    }
}

/// Map a non-success response to a retrieval error
fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());
        if remaining == Some("0") {
            return Err(Error::Retrieval(format!(
                "{} rejected: GitHub API rate limit exhausted",
                what
            )));
        }
    }

    Err(Error::Retrieval(format!("{} returned {}", what, status)))
}

/// `Link` header advertises another page
fn has_next_page(response: &Response) -> bool {
    response
        .headers()
        .get("Link")
        .and_then(|v| v.to_str().ok())
        .map(|link| link.contains("rel=\"next\""))
        .unwrap_or(false)
}

impl GitHubApi for GitHubClient {
    async fn rate_limit(&self) -> Result<QuotaState> {
        let url = format!("{}/rate_limit", self.api_base);
        let response = self.send(&url, "rate limit").await?;
        let body: RateLimitResponse = response.json().await.map_err(|e| {
            Error::Retrieval(format!("Failed to parse rate limit response: {}", e))
        })?;

        Ok(QuotaState {
            remaining: body.rate.remaining,
            reset_at: body.rate.reset,
        })
    }

    async fn feed(&self) -> Result<String> {
        let response = self.send(&self.feed_url, "activity feed").await?;
        Ok(response.text().await?)
    }

    async fn commit_files(&self, item: &WorkItem) -> Result<Vec<CommitFile>> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, item.owner, item.repo, item.commit_id
        );

        let mut all_files = Vec::new();
        let mut page = 1u32;

        loop {
            let paged = format!("{}?per_page=100&page={}", url, page);
            let response = self.send(&paged, "commit metadata").await?;
            let has_next = has_next_page(&response);

            let commit: CommitDetails = response.json().await.map_err(|e| {
                Error::Retrieval(format!("Failed to parse commit response: {}", e))
            })?;

            if let Some(files) = commit.files {
                all_files.extend(files);
            }

            if !has_next {
                break;
            }

            page += 1;
            if page > MAX_COMMIT_PAGES {
                return Err(Error::Retrieval(format!(
                    "{} touches more than {} pages of files",
                    item,
                    MAX_COMMIT_PAGES
                )));
            }
        }

        Ok(all_files)
    }

    async fn download(&self, raw_url: &str) -> Result<Vec<u8>> {
        let response = self.send(raw_url, "raw file").await?;
        Ok(response.bytes().await?.to_vec())
    }
}
