//! GitHub Actions REST client

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::{ActionsError, Result};
use crate::types::{Artifact, ArtifactsPage, BuildRun, RepoId, RunId, WorkflowRunsPage};

/// Public GitHub API endpoint
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("apkpilot/", env!("CARGO_PKG_VERSION"));

/// Runs requested per poll; the newest run is always on the first page
const RUNS_PER_PAGE: u32 = 20;

/// Request/response operations the build monitor needs from a CI service
#[async_trait]
pub trait BuildService: Send + Sync {
    /// List recent runs, most recent first. Empty when nothing has run yet.
    async fn list_runs(&self, repo: &RepoId) -> Result<Vec<BuildRun>>;

    /// Fetch the compressed log archive of a run
    async fn fetch_logs(&self, repo: &RepoId, run_id: RunId) -> Result<Vec<u8>>;

    /// List the artifacts attached to a run
    async fn list_artifacts(&self, repo: &RepoId, run_id: RunId) -> Result<Vec<Artifact>>;

    /// Download the compressed archive behind an artifact
    async fn download_artifact(&self, artifact: &Artifact) -> Result<Vec<u8>>;
}

/// Connection settings for the GitHub API
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL (public GitHub or an Enterprise server)
    pub api_url: String,
    /// Personal access token sent as a bearer token
    pub token: String,
    /// Deadline for each individual request
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: GITHUB_API_BASE.to_string(),
            token: token.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Authenticated GitHub Actions client
pub struct GitHubActionsClient {
    config: ClientConfig,
    client: Client,
}

impl GitHubActionsClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(ActionsError::Configuration(
                "GitHub token must not be empty".to_string(),
            ));
        }

        url::Url::parse(&config.api_url).map_err(|e| {
            ActionsError::Configuration(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build an absolute URL for an API path
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Start an authenticated request
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!(url, "GitHub API request: GET");
        let response = self.request(Method::GET, url).send().await?;
        let response = check_status(response, what).await?;
        Ok(response.json().await?)
    }

    async fn get_bytes(&self, url: &str, what: &str) -> Result<Vec<u8>> {
        debug!(url, "GitHub API download: GET");
        let response = self.request(Method::GET, url).send().await?;
        let response = check_status(response, what).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl BuildService for GitHubActionsClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_runs(&self, repo: &RepoId) -> Result<Vec<BuildRun>> {
        let start = std::time::Instant::now();
        let url = self.endpoint(&format!(
            "repos/{}/{}/actions/runs?per_page={}",
            repo.owner, repo.name, RUNS_PER_PAGE
        ));

        let page: WorkflowRunsPage = self.get_json(&url, "workflow runs").await?;
        info!(
            repo = %repo,
            count = page.workflow_runs.len(),
            duration_ms = start.elapsed().as_millis(),
            "listed workflow runs"
        );
        Ok(page.workflow_runs)
    }

    #[instrument(skip(self), fields(repo = %repo, run_id = %run_id))]
    async fn fetch_logs(&self, repo: &RepoId, run_id: RunId) -> Result<Vec<u8>> {
        let start = std::time::Instant::now();
        let url = self.endpoint(&format!(
            "repos/{}/{}/actions/runs/{}/logs",
            repo.owner, repo.name, run_id
        ));

        let bytes = self
            .get_bytes(&url, &format!("logs for run {}", run_id))
            .await?;
        info!(
            repo = %repo,
            run_id = %run_id,
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis(),
            "downloaded run logs"
        );
        Ok(bytes)
    }

    #[instrument(skip(self), fields(repo = %repo, run_id = %run_id))]
    async fn list_artifacts(&self, repo: &RepoId, run_id: RunId) -> Result<Vec<Artifact>> {
        let url = self.endpoint(&format!(
            "repos/{}/{}/actions/runs/{}/artifacts",
            repo.owner, repo.name, run_id
        ));

        let page: ArtifactsPage = self
            .get_json(&url, &format!("artifacts for run {}", run_id))
            .await?;
        info!(repo = %repo, run_id = %run_id, count = page.artifacts.len(), "listed artifacts");
        Ok(page.artifacts)
    }

    #[instrument(skip(self, artifact), fields(artifact = %artifact.name))]
    async fn download_artifact(&self, artifact: &Artifact) -> Result<Vec<u8>> {
        if artifact.expired {
            return Err(ActionsError::NotFound(format!(
                "artifact '{}' has expired",
                artifact.name
            )));
        }

        let start = std::time::Instant::now();
        let bytes = self
            .get_bytes(
                &artifact.archive_download_url,
                &format!("artifact '{}'", artifact.name),
            )
            .await?;
        info!(
            artifact = %artifact.name,
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis(),
            "downloaded artifact"
        );
        Ok(bytes)
    }
}

/// Map non-success statuses onto the error taxonomy
pub(crate) async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ActionsError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => ActionsError::Authentication(api_message(&message)),
        _ => ActionsError::Api {
            status: status.as_u16(),
            message: api_message(&message),
        },
    })
}

/// Pull the `message` field out of a GitHub error body, falling back to the raw text
pub(crate) fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Comma-separated header value as a list
pub(crate) fn header_list(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
