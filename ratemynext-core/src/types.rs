//! Core data type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ErrorKind, RateError};

/// Normalized identifier of an analyzed `(owner, repo, sub_path)` triple.
///
/// Used as the primary key of stored results and as the leaderboard member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoKey(String);

impl RepoKey {
    /// Wrap an already-normalized key, e.g. one read back from storage
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of an entry in a repository tree listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Other,
}

impl EntryKind {
    /// Map the hosting API's `type` field
    pub fn from_api(value: &str) -> Self {
        match value {
            "blob" => EntryKind::Blob,
            "tree" => EntryKind::Tree,
            _ => EntryKind::Other,
        }
    }
}

/// One path in a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// Full recursive listing of a ref
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// Set when the hosting API cut the listing short
    pub truncated: bool,
}

/// Structural counts of the files under an application root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub pages: u64,
    pub components: u64,
    pub api_routes: u64,
    pub total_files: u64,
}

/// Build/runtime features detected from manifest and config content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub is_turbo: bool,
    pub is_tailwind: bool,
    pub is_ppr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    pub pages: u64,
    pub components: u64,
    pub api_routes: u64,
    pub total_files: u64,
    pub is_turbo: bool,
    pub is_tailwind: bool,
    #[serde(rename = "isPPR")]
    pub is_ppr: bool,
    pub score: u64,
}

impl RepoStats {
    pub fn counts(&self) -> FileCounts {
        FileCounts {
            pages: self.pages,
            components: self.components,
            api_routes: self.api_routes,
            total_files: self.total_files,
        }
    }

    pub fn features(&self) -> FeatureFlags {
        FeatureFlags {
            is_turbo: self.is_turbo,
            is_tailwind: self.is_tailwind,
            is_ppr: self.is_ppr,
        }
    }
}

/// Provenance and freshness of a stored result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    pub url: String,
    pub owner: String,
    pub repo: String,
    pub sub_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Unit of storage and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoData {
    pub stats: RepoStats,
    pub info: RepoInfo,
}

/// One ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub key: RepoKey,
    pub score: u64,
    /// Stored details, when the detail write for this key succeeded
    pub info: Option<RepoInfo>,
}

/// Serializable outcome of the caller-facing analysis contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisResponse {
    Ok { data: RepoData },
    Error { error: ErrorKind, message: String },
}

impl From<Result<RepoData, RateError>> for AnalysisResponse {
    fn from(result: Result<RepoData, RateError>) -> Self {
        match result {
            Ok(data) => AnalysisResponse::Ok { data },
            Err(err) => {
                let err = err.into_analysis_error();
                AnalysisResponse::Error {
                    error: err.kind(),
                    message: err.user_message().to_string(),
                }
            }
        }
    }
}

/// Configuration information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    pub github: GitHubConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub base_url: String,
    /// Falls back to `GITHUB_TOKEN` when unset
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Stored results younger than this are served without fetching
    pub freshness_ttl_secs: u64,
    /// Lifetime of the process-local read cache in front of the result store
    pub read_ttl_secs: u64,
    /// Window in which identical calls share one pipeline execution
    pub memo_ttl_secs: u64,
    pub memo_max_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncatedTreePolicy {
    /// Abort with `TreeTruncated`
    Fail,
    /// Score whatever the listing contained
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub truncated_tree: TruncatedTreePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> RepoData {
        RepoData {
            stats: RepoStats {
                pages: 2,
                components: 5,
                api_routes: 1,
                total_files: 20,
                is_turbo: true,
                is_tailwind: false,
                is_ppr: true,
                score: 620,
            },
            info: RepoInfo {
                url: "https://github.com/acme/shop".to_string(),
                owner: "acme".to_string(),
                repo: "shop".to_string(),
                sub_path: None,
                updated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_stats_use_wire_field_names() {
        let json = serde_json::to_value(sample_data().stats).unwrap();
        assert_eq!(json["apiRoutes"], 1);
        assert_eq!(json["totalFiles"], 20);
        assert_eq!(json["isPPR"], true);
        assert_eq!(json["isTailwind"], false);
    }

    #[test]
    fn test_response_from_error_hides_details() {
        let response = AnalysisResponse::from(Err(RateError::RepoNotFound {
            owner: "acme".to_string(),
            repo: "missing".to_string(),
        }));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "repo_not_found");
        assert_eq!(json["message"], "Repository not found");
    }

    #[test]
    fn test_response_from_data() {
        let data = sample_data();
        match AnalysisResponse::from(Ok(data.clone())) {
            AnalysisResponse::Ok { data: inner } => assert_eq!(inner, data),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_entry_kind_from_api() {
        assert_eq!(EntryKind::from_api("blob"), EntryKind::Blob);
        assert_eq!(EntryKind::from_api("tree"), EntryKind::Tree);
        assert_eq!(EntryKind::from_api("commit"), EntryKind::Other);
    }
}
