//! In-memory key-value backend

use async_trait::async_trait;
use ratemynext_core::{KeyValueStore, RateResult, RepoData, RepoKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local store; contents are lost on exit
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    hashes: Arc<RwLock<HashMap<RepoKey, RepoData>>>,
    sorted_sets: Arc<RwLock<HashMap<String, HashMap<RepoKey, u64>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn hash_set(&self, key: &RepoKey, data: &RepoData) -> RateResult<()> {
        let mut hashes = self.hashes.write().await;
        hashes.insert(key.clone(), data.clone());
        debug!("Saved {} to memory storage", key);
        Ok(())
    }

    async fn hash_get(&self, key: &RepoKey) -> RateResult<Option<RepoData>> {
        let hashes = self.hashes.read().await;
        Ok(hashes.get(key).cloned())
    }

    async fn sorted_set_add(&self, set: &str, member: &RepoKey, score: u64) -> RateResult<()> {
        let mut sets = self.sorted_sets.write().await;
        sets.entry(set.to_string())
            .or_default()
            .insert(member.clone(), score);
        Ok(())
    }

    async fn sorted_set_range(
        &self,
        set: &str,
        start: usize,
        stop: usize,
        reversed: bool,
    ) -> RateResult<Vec<(RepoKey, u64)>> {
        if stop < start {
            return Ok(Vec::new());
        }

        let sets = self.sorted_sets.read().await;
        let Some(members) = sets.get(set) else {
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(RepoKey, u64)> = members
            .iter()
            .map(|(member, score)| (member.clone(), *score))
            .collect();

        ranked.sort_by(|(a_key, a_score), (b_key, b_score)| {
            let by_score = if reversed {
                b_score.cmp(a_score)
            } else {
                a_score.cmp(b_score)
            };
            by_score.then_with(|| a_key.as_str().cmp(b_key.as_str()))
        });

        Ok(ranked
            .into_iter()
            .skip(start)
            .take((stop - start).saturating_add(1))
            .collect())
    }

    async fn health_check(&self) -> RateResult<()> {
        Ok(())
    }
}
