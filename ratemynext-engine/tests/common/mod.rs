//! Shared test doubles for engine tests
//!
//! `StubHost` serves a fixed tree and file map and counts every call; `FlakyStore`
//! wraps the memory backend and can be told to fail individual operations.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratemynext_core::{
    storage_error, KeyValueStore, RateConfig, RateError, RateResult, RepoData, RepoInfo, RepoKey,
    RepoStats, SourceHost, StorageBackend, TreeEntry, TreeListing,
};
use ratemynext_engine::MemoryKeyValueStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ratemynext_engine=debug,info")
            .with_test_writer()
            .try_init();
    });
}

/// Default configuration with the memory backend
pub fn test_config() -> RateConfig {
    let mut config = RateConfig::default();
    config.storage.backend = StorageBackend::Memory;
    config
}

#[derive(Default)]
pub struct StubHost {
    pub entries: Vec<TreeEntry>,
    pub truncated: bool,
    pub files: HashMap<String, String>,
    pub branch_error: Option<RateError>,
    pub tree_delay: Option<Duration>,
    pub branch_calls: AtomicUsize,
    pub tree_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
}

impl StubHost {
    pub fn with_blobs(paths: &[&str]) -> Self {
        Self {
            entries: paths.iter().map(|p| TreeEntry::blob(*p)).collect(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.branch_calls.load(Ordering::SeqCst)
            + self.tree_calls.load(Ordering::SeqCst)
            + self.content_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceHost for StubHost {
    async fn get_default_branch(&self, _owner: &str, _repo: &str) -> RateResult<String> {
        self.branch_calls.fetch_add(1, Ordering::SeqCst);
        match &self.branch_error {
            Some(err) => Err(err.clone()),
            None => Ok("main".to_string()),
        }
    }

    async fn get_tree(&self, _owner: &str, _repo: &str, git_ref: &str) -> RateResult<TreeListing> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(git_ref, "main");
        if let Some(delay) = self.tree_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(TreeListing {
            entries: self.entries.clone(),
            truncated: self.truncated,
        })
    }

    async fn get_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> RateResult<Option<String>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.get(path).cloned())
    }
}

/// Memory backend with switchable failures
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryKeyValueStore,
    pub fail_hash_set: AtomicBool,
    pub fail_hash_get: AtomicBool,
    pub fail_sorted_set_add: AtomicBool,
    pub hash_get_calls: AtomicUsize,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, operation: &str) -> RateResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(storage_error!("injected failure", "flaky_store", operation));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn hash_set(&self, key: &RepoKey, data: &RepoData) -> RateResult<()> {
        Self::check(&self.fail_hash_set, "hash_set")?;
        self.inner.hash_set(key, data).await
    }

    async fn hash_get(&self, key: &RepoKey) -> RateResult<Option<RepoData>> {
        self.hash_get_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_hash_get, "hash_get")?;
        self.inner.hash_get(key).await
    }

    async fn sorted_set_add(&self, set: &str, member: &RepoKey, score: u64) -> RateResult<()> {
        Self::check(&self.fail_sorted_set_add, "sorted_set_add")?;
        self.inner.sorted_set_add(set, member, score).await
    }

    async fn sorted_set_range(
        &self,
        set: &str,
        start: usize,
        stop: usize,
        reversed: bool,
    ) -> RateResult<Vec<(RepoKey, u64)>> {
        self.inner.sorted_set_range(set, start, stop, reversed).await
    }

    async fn health_check(&self) -> RateResult<()> {
        self.inner.health_check().await
    }
}

/// Stored result with the given score and timestamp
pub fn sample_data(owner: &str, repo: &str, score: u64, updated_at: DateTime<Utc>) -> RepoData {
    RepoData {
        stats: RepoStats {
            pages: 1,
            components: 0,
            api_routes: 0,
            total_files: 3,
            is_turbo: false,
            is_tailwind: false,
            is_ppr: false,
            score,
        },
        info: RepoInfo {
            url: format!("https://github.com/{}/{}", owner, repo),
            owner: owner.to_string(),
            repo: repo.to_string(),
            sub_path: None,
            updated_at,
        },
    }
}
