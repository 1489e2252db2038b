//! Analysis pipeline
//!
//! [`Engine::analyze`] turns a repository reference into scored [`RepoData`]:
//!
//! 1. parse the reference and derive its key (no network)
//! 2. serve a stored result still inside the freshness window
//! 3. fetch the default branch and the full tree
//! 4. resolve the application root
//! 5. classify files while fetching feature sources
//! 6. score, stamp and persist
//!
//! Identical inputs arriving within the memo window share one execution. Outcomes that a
//! later retry could change (rate limits, upstream and storage failures) are not replayed.

use chrono::Utc;
use ratemynext_core::{
    log_operation_start, log_operation_success, performance, AnalysisResponse, KeyValueStore,
    LeaderboardEntry, RateConfig, RateError, RateResult, RepoData, RepoInfo, RepoKey, SourceHost,
    TreeListing, TruncatedTreePolicy,
};
use ratemynext_repo::{
    build_stats, classify_files, fetch_features, resolve_root, ApiClientConfig, GitHubApiClient,
    RepoReference,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::MemoCache;
use crate::store::{open_backend, ResultStore};

fn is_replayable(outcome: &RateResult<RepoData>) -> bool {
    !matches!(outcome, Err(e) if e.is_recoverable())
}

/// Repository analysis engine
pub struct Engine {
    host: Arc<dyn SourceHost>,
    store: ResultStore,
    memo: MemoCache<RateResult<RepoData>>,
    freshness_ttl: Duration,
    truncated_tree: TruncatedTreePolicy,
}

impl Engine {
    /// Assemble an engine from explicit collaborators
    pub fn new(
        host: Arc<dyn SourceHost>,
        backend: Arc<dyn KeyValueStore>,
        config: &RateConfig,
    ) -> Self {
        let cache = &config.cache;
        Self {
            host,
            store: ResultStore::new(backend, Duration::from_secs(cache.read_ttl_secs)),
            memo: MemoCache::new(
                cache.memo_max_entries,
                Duration::from_secs(cache.memo_ttl_secs),
            )
            .retain_when(is_replayable),
            freshness_ttl: Duration::from_secs(cache.freshness_ttl_secs),
            truncated_tree: config.analysis.truncated_tree,
        }
    }

    /// Build the GitHub client and storage backend described by `config`
    pub async fn from_config(config: &RateConfig) -> RateResult<Self> {
        config.validate()?;

        let client_config = ApiClientConfig::from_config(&config.github, config.resolve_token());
        let host: Arc<dyn SourceHost> = Arc::new(GitHubApiClient::new(client_config)?);
        let backend = open_backend(&config.storage).await?;

        info!(
            backend = ?config.storage.backend,
            base_url = %config.github.base_url,
            "Analysis engine ready"
        );

        Ok(Self::new(host, backend, config))
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Analyze `reference`, reusing a fresh stored result when one exists.
    ///
    /// Storage failures are reported as `UpstreamUnexpected`.
    pub async fn analyze(&self, reference: &str) -> RateResult<RepoData> {
        self.memo
            .get_or_run(reference, || self.analyze_uncached(reference))
            .await
    }

    /// Serializable outcome of [`Engine::analyze`]
    pub async fn respond(&self, reference: &str) -> AnalysisResponse {
        AnalysisResponse::from(self.analyze(reference).await)
    }

    /// Stored result for `reference` regardless of age; never contacts the host
    pub async fn lookup(&self, reference: &str) -> RateResult<Option<RepoData>> {
        let parsed = RepoReference::parse(reference)?;
        self.store.get(&parsed.key()).await
    }

    /// Top `n` leaderboard rows joined with their stored details
    pub async fn leaderboard(&self, n: usize) -> RateResult<Vec<LeaderboardEntry>> {
        let ranked = self.store.top_n(n).await?;

        let mut entries = Vec::with_capacity(ranked.len());
        for (key, score) in ranked {
            let info = self.store.get(&key).await?.map(|data| data.info);
            entries.push(LeaderboardEntry { key, score, info });
        }
        Ok(entries)
    }

    async fn analyze_uncached(&self, reference: &str) -> RateResult<RepoData> {
        log_operation_start!("analyze", reference = %reference);

        let result = self.run_pipeline(reference).await;
        match &result {
            Ok(data) => {
                log_operation_success!("analyze", owner = %data.info.owner, score = data.stats.score);
            }
            Err(err) => err.log(),
        }
        result
    }

    async fn run_pipeline(&self, reference: &str) -> RateResult<RepoData> {
        let parsed = RepoReference::parse(reference)?;
        let key = parsed.key();

        if let Some(data) = self.fresh_result(&key).await? {
            debug!(key = %key, "Serving stored result inside freshness window");
            return Ok(data);
        }

        let owner = parsed.owner.as_str();
        let repo = parsed.repo.as_str();
        let host = self.host.as_ref();

        let branch = performance::measure_async(
            "default_branch",
            host.get_default_branch(owner, repo),
        )
        .await?;

        let listing =
            performance::measure_async("fetch_tree", host.get_tree(owner, repo, &branch)).await?;
        let listing = self.apply_truncation_policy(&parsed, listing)?;

        let root = resolve_root(&listing.entries, parsed.sub_path.as_deref())?;
        debug!(config = %root.config_path, app_dir = %root.app_dir, "Resolved application root");

        let classify = async { classify_files(&listing.entries, &root) };
        let (counts, features) = tokio::join!(
            classify,
            performance::measure_async(
                "fetch_features",
                fetch_features(host, owner, repo, &branch, &root),
            ),
        );
        let stats = build_stats(counts, features?);

        let data = RepoData {
            stats,
            info: RepoInfo {
                url: reference.trim().to_string(),
                owner: parsed.owner.clone(),
                repo: parsed.repo.clone(),
                sub_path: parsed.sub_path.clone(),
                updated_at: Utc::now(),
            },
        };

        self.store
            .save(&key, &data)
            .await
            .map_err(RateError::into_analysis_error)?;

        Ok(data)
    }

    async fn fresh_result(&self, key: &RepoKey) -> RateResult<Option<RepoData>> {
        if self.freshness_ttl.is_zero() {
            return Ok(None);
        }

        let stored = self
            .store
            .get(key)
            .await
            .map_err(RateError::into_analysis_error)?;

        Ok(stored.filter(|data| {
            // clock skew counts as fresh
            Utc::now()
                .signed_duration_since(data.info.updated_at)
                .to_std()
                .map_or(true, |age| age < self.freshness_ttl)
        }))
    }

    fn apply_truncation_policy(
        &self,
        parsed: &RepoReference,
        listing: TreeListing,
    ) -> RateResult<TreeListing> {
        if !listing.truncated {
            return Ok(listing);
        }

        match self.truncated_tree {
            TruncatedTreePolicy::Fail => Err(RateError::TreeTruncated {
                owner: parsed.owner.clone(),
                repo: parsed.repo.clone(),
            }),
            TruncatedTreePolicy::Partial => {
                warn!(
                    reference = %parsed,
                    entries = listing.entries.len(),
                    "Tree listing truncated, scoring partial listing"
                );
                Ok(listing)
            }
        }
    }
}
