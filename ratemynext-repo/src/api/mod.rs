//! Hosting API client
//!
//! Talks to the GitHub REST API for default branches, recursive tree listings and file
//! contents. Non-success statuses are translated into the engine's error taxonomy here,
//! in one place, so every call site reports the same kinds.

use ratemynext_core::{upstream_error, GitHubConfig, RateError, RateResult};
use std::collections::HashMap;

pub mod github;


pub use github::GitHubApiClient;

/// Configuration for API clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Access token for authentication
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            access_token: None,
            timeout_seconds: 30,
            user_agent: format!("ratemynext/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Build from the `[github]` config section and an already-resolved token
    pub fn from_config(config: &GitHubConfig, access_token: Option<String>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            access_token,
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            headers: HashMap::new(),
        }
    }
}

/// Which hosting API call failed; the same status means different things per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    RepoInfo,
    Tree,
    FileContent,
}

impl ApiOperation {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::RepoInfo => "get_default_branch",
            ApiOperation::Tree => "get_tree",
            ApiOperation::FileContent => "get_file_content",
        }
    }
}

/// Details of a non-success response, extracted before the body is consumed
#[derive(Debug, Clone, Default)]
pub struct FailedResponse {
    pub status: u16,
    /// `x-ratelimit-remaining` was `0` or the body mentions a rate limit
    pub rate_limit_exhausted: bool,
    /// `retry-after` header in seconds
    pub retry_after_secs: Option<u64>,
    pub body: String,
}

/// Translate a failed response into the error taxonomy.
///
/// 404 on repository lookup is `RepoNotFound`, 401 is `InvalidToken`, 403 is
/// `AuthRequired` unless the rate limit is exhausted, 429 is `RateLimited`. Tree
/// listings report any other failure as `FetchFailed`.
pub fn classify_failure(
    operation: ApiOperation,
    owner: &str,
    repo: &str,
    failed: &FailedResponse,
) -> RateError {
    let rate_limited = RateError::RateLimited {
        retry_after_secs: failed.retry_after_secs,
    };

    match (operation, failed.status) {
        (_, 429) => rate_limited,
        (_, 403) if failed.rate_limit_exhausted => rate_limited,
        (ApiOperation::Tree, status) => RateError::FetchFailed {
            owner: owner.to_string(),
            repo: repo.to_string(),
            status,
        },
        (ApiOperation::RepoInfo, 404) => RateError::RepoNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
        },
        (_, 401) => RateError::InvalidToken,
        (_, 403) => RateError::AuthRequired {
            owner: owner.to_string(),
            repo: repo.to_string(),
        },
        (operation, status) => upstream_error!(
            format!("HTTP {} from hosting API for {}/{}", status, owner, repo),
            "api_client",
            operation.as_str()
        ),
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> RateResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            upstream_error!(
                format!("Invalid user agent: {}", e),
                "http_client",
                "create_client"
            )
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            upstream_error!(
                format!("Invalid header name '{}': {}", key, e),
                "http_client",
                "create_client"
            )
        })?;

        let header_value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
            upstream_error!(
                format!("Invalid header value for '{}': {}", key, e),
                "http_client",
                "create_client"
            )
        })?;

        headers.insert(header_name, header_value);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| {
            upstream_error!(
                format!("Failed to create HTTP client: {}", e),
                "http_client",
                "create_client"
            )
        })?;

    Ok(client)
}

/// Helper function to capture what classification needs from an error response
pub(crate) async fn read_failed_response(response: reqwest::Response) -> FailedResponse {
    let status = response.status().as_u16();
    let headers = response.headers();

    let remaining_zero = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    let retry_after_secs = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    let body_mentions_limit = body.to_lowercase().contains("rate limit");

    FailedResponse {
        status,
        rate_limit_exhausted: remaining_zero || body_mentions_limit,
        retry_after_secs,
        body,
    }
}
