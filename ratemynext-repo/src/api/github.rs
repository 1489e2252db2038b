//! GitHub API client implementation

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::{debug, info, warn};
use ratemynext_core::{upstream_error, EntryKind, RateResult, SourceHost, TreeEntry, TreeListing};
use serde::Deserialize;

use super::{
    classify_failure, create_http_client, read_failed_response, ApiClientConfig, ApiOperation,
};

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubRepository {
    pub(crate) default_branch: String,
}

/// GitHub tree response
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubTreeResponse {
    pub(crate) tree: Vec<GitHubTreeItem>,
    pub(crate) truncated: Option<bool>,
}

/// GitHub tree item
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubTreeItem {
    pub(crate) path: Option<String>,
    #[serde(rename = "type")]
    pub(crate) item_type: String,
}

/// GitHub content response
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubContentResponse {
    pub(crate) content: String,
    pub(crate) encoding: String,
}

impl GitHubTreeResponse {
    /// Entries without a path are dropped
    pub(crate) fn into_listing(self) -> TreeListing {
        let entries = self
            .tree
            .into_iter()
            .filter_map(|item| {
                item.path.map(|path| TreeEntry {
                    path,
                    kind: EntryKind::from_api(&item.item_type),
                })
            })
            .collect();

        TreeListing {
            entries,
            truncated: self.truncated.unwrap_or(false),
        }
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(config: ApiClientConfig) -> RateResult<Self> {
        let client = create_http_client(&config)?;

        info!(
            "Created GitHub API client for {} (authenticated: {})",
            config.base_url,
            config.access_token.is_some()
        );

        Ok(Self { client, config })
    }

    /// Create authorization headers
    fn create_auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref token) = self.config.access_token {
            if let Ok(auth_value) =
                reqwest::header::HeaderValue::from_str(&format!("token {}", token))
            {
                headers.insert(reqwest::header::AUTHORIZATION, auth_value);
            }
        }

        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        headers
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Make a GET request to GitHub API, returning the raw response whatever its status
    async fn get_request(
        &self,
        endpoint: &str,
        operation: ApiOperation,
    ) -> RateResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint);

        debug!("Making GitHub API request to: {}", url);

        self.client
            .get(&url)
            .headers(self.create_auth_headers())
            .send()
            .await
            .map_err(|e| {
                upstream_error!(
                    format!("Failed to make request to GitHub API: {}", e),
                    "github_api_client",
                    operation.as_str()
                )
            })
    }

    /// GET and fail on non-success statuses
    async fn get_success(
        &self,
        endpoint: &str,
        operation: ApiOperation,
        owner: &str,
        repo: &str,
    ) -> RateResult<reqwest::Response> {
        let response = self.get_request(endpoint, operation).await?;

        if !response.status().is_success() {
            let failed = read_failed_response(response).await;
            debug!(
                "GitHub API {} failed with HTTP {}: {}",
                operation.as_str(),
                failed.status,
                failed.body
            );
            return Err(classify_failure(operation, owner, repo, &failed));
        }

        Ok(response)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: ApiOperation,
    ) -> RateResult<T> {
        response.json().await.map_err(|e| {
            upstream_error!(
                format!("Failed to parse GitHub response: {}", e),
                "github_api_client",
                operation.as_str()
            )
        })
    }
}

/// Decode base64 content from GitHub API
pub(crate) fn decode_base64_content(content: &str) -> RateResult<String> {
    let cleaned_content = content.replace(['\n', '\r', ' '], "");

    let decoded_bytes = BASE64.decode(&cleaned_content).map_err(|e| {
        upstream_error!(
            format!("Failed to decode base64 content: {}", e),
            "github_api_client",
            "decode_base64_content"
        )
    })?;

    // Feature detection only does substring checks, so stray bytes are harmless
    Ok(String::from_utf8_lossy(&decoded_bytes).into_owned())
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl SourceHost for GitHubApiClient {
    async fn get_default_branch(&self, owner: &str, repo: &str) -> RateResult<String> {
        info!("Fetching GitHub repository metadata for {}/{}", owner, repo);

        let endpoint = format!("repos/{}/{}", owner, repo);
        let response = self
            .get_success(&endpoint, ApiOperation::RepoInfo, owner, repo)
            .await?;

        let github_repo: GitHubRepository =
            Self::parse_json(response, ApiOperation::RepoInfo).await?;

        Ok(github_repo.default_branch)
    }

    async fn get_tree(&self, owner: &str, repo: &str, git_ref: &str) -> RateResult<TreeListing> {
        info!(
            "Fetching GitHub file tree for {}/{} (ref: {})",
            owner, repo, git_ref
        );

        let endpoint = format!(
            "repos/{}/{}/git/trees/{}?recursive=1",
            owner,
            repo,
            urlencoding::encode(git_ref)
        );
        let response = self
            .get_success(&endpoint, ApiOperation::Tree, owner, repo)
            .await?;

        let tree_response: GitHubTreeResponse =
            Self::parse_json(response, ApiOperation::Tree).await?;
        let listing = tree_response.into_listing();

        if listing.truncated {
            warn!("GitHub file tree was truncated for {}/{}", owner, repo);
        }

        info!(
            "Retrieved {} entries from GitHub repository {}/{}",
            listing.entries.len(),
            owner,
            repo
        );
        Ok(listing)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> RateResult<Option<String>> {
        debug!(
            "Fetching GitHub file content for {}/{}/{}",
            owner, repo, path
        );

        let endpoint = format!(
            "repos/{}/{}/contents/{}?ref={}",
            owner,
            repo,
            encode_path(path),
            urlencoding::encode(git_ref)
        );

        let response = self.get_request(&endpoint, ApiOperation::FileContent).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Missing file is not an error
            debug!("File {} not found in {}/{}", path, owner, repo);
            return Ok(None);
        }

        if !response.status().is_success() {
            let failed = read_failed_response(response).await;
            return Err(classify_failure(
                ApiOperation::FileContent,
                owner,
                repo,
                &failed,
            ));
        }

        let content_response: GitHubContentResponse =
            Self::parse_json(response, ApiOperation::FileContent).await?;

        if content_response.encoding != "base64" {
            return Err(upstream_error!(
                format!("Unexpected encoding: {}", content_response.encoding),
                "github_api_client",
                "get_file_content"
            ));
        }

        decode_base64_content(&content_response.content).map(Some)
    }
}
