//! Core trait definitions
//!
//! The engine reaches its two external collaborators only through these traits, so a
//! pipeline can be assembled from real clients or from test stubs.

use crate::error::RateResult;
use crate::types::*;
use async_trait::async_trait;

/// Read-only access to a version-control hosting API
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Default branch name of the repository
    async fn get_default_branch(&self, owner: &str, repo: &str) -> RateResult<String>;

    /// Full recursive listing of `git_ref`
    async fn get_tree(&self, owner: &str, repo: &str, git_ref: &str) -> RateResult<TreeListing>;

    /// Decoded text content of one file, `None` when the file does not exist
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> RateResult<Option<String>>;
}

/// Durable key-value primitives backing the result store.
///
/// Each call is an independent atomic write or read; nothing spans two calls.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Replace the hash stored at `key`
    async fn hash_set(&self, key: &RepoKey, data: &RepoData) -> RateResult<()>;

    async fn hash_get(&self, key: &RepoKey) -> RateResult<Option<RepoData>>;

    /// Add `member` to the sorted set, overwriting its previous score
    async fn sorted_set_add(&self, set: &str, member: &RepoKey, score: u64) -> RateResult<()>;

    /// Members ranked `start..=stop` (inclusive, zero-based)
    ///
    /// `reversed` ranks by score descending. Ties are ordered by member ascending.
    async fn sorted_set_range(
        &self,
        set: &str,
        start: usize,
        stop: usize,
        reversed: bool,
    ) -> RateResult<Vec<(RepoKey, u64)>>;

    /// Health check for the storage backend
    async fn health_check(&self) -> RateResult<()>;
}
