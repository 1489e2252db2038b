//! Result store
//!
//! Persists one [`RepoData`] per repository key plus a leaderboard ranking keys by
//! score. The two writes of [`ResultStore::save`] are independent: a reader may briefly
//! see one without the other.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryKeyValueStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteKeyValueStore;

use crate::cache::TtlCache;
use ratemynext_core::{
    KeyValueStore, RateResult, RepoData, RepoKey, StorageBackend, StorageConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sorted set holding every analyzed key ranked by score
pub const LEADERBOARD_KEY: &str = "leaderboard";

const READ_CACHE_ENTRIES: usize = 1024;

pub struct ResultStore {
    backend: Arc<dyn KeyValueStore>,
    read_cache: TtlCache<RepoKey, RepoData>,
}

impl ResultStore {
    /// Wrap a backend; `read_ttl` of zero disables the read-through cache
    pub fn new(backend: Arc<dyn KeyValueStore>, read_ttl: Duration) -> Self {
        Self {
            backend,
            read_cache: TtlCache::new(READ_CACHE_ENTRIES, read_ttl),
        }
    }

    /// Write the detail record and the leaderboard score.
    ///
    /// Both writes are attempted even when the first fails; the first failure is
    /// returned. Nothing is rolled back.
    pub async fn save(&self, key: &RepoKey, data: &RepoData) -> RateResult<()> {
        let detail = self.backend.hash_set(key, data).await;
        let ranking = self
            .backend
            .sorted_set_add(LEADERBOARD_KEY, key, data.stats.score)
            .await;

        match &detail {
            Ok(()) => self.read_cache.insert(key.clone(), data.clone()),
            Err(_) => {
                self.read_cache.remove(key);
            }
        }

        match (detail, ranking) {
            (Err(err), ranking) => {
                if let Err(other) = ranking {
                    warn!(key = %key, error = %other, "Leaderboard write also failed");
                }
                Err(err)
            }
            (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => {
                debug!(key = %key, score = data.stats.score, "Saved analysis result");
                Ok(())
            }
        }
    }

    /// Stored result for `key`, served from the read cache while it is warm
    pub async fn get(&self, key: &RepoKey) -> RateResult<Option<RepoData>> {
        if let Some(data) = self.read_cache.get(key) {
            debug!(key = %key, "Read cache hit");
            return Ok(Some(data));
        }

        let data = self.backend.hash_get(key).await?;
        if let Some(data) = &data {
            self.read_cache.insert(key.clone(), data.clone());
        }
        Ok(data)
    }

    /// Up to `n` keys with the highest scores, ties broken by key ascending
    pub async fn top_n(&self, n: usize) -> RateResult<Vec<(RepoKey, u64)>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.backend
            .sorted_set_range(LEADERBOARD_KEY, 0, n - 1, true)
            .await
    }
}

/// Open the backend selected by configuration
pub async fn open_backend(config: &StorageConfig) -> RateResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryKeyValueStore::new())),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            let store = SqliteKeyValueStore::from_url(&config.database_url).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => Err(ratemynext_core::config_error!(
            "SQLite storage requires the 'sqlite' feature",
            "result_store"
        )),
    }
}
