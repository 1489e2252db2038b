//! Process-local caches
//!
//! [`TtlCache`] is a small expiring map used in front of the result store. [`MemoCache`]
//! builds on it to collapse identical calls made within a short window into one
//! execution whose outcome every caller shares.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::debug;

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory map with a fixed TTL and LRU eviction.
///
/// Expired entries are dropped lazily on access. A zero TTL disables the cache.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    max_size: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size: max_size.max(1),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                debug!("Cache entry expired and removed: {:?}", key);
                None
            }
            Some(entry) => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }

        let mut entries = self.lock();
        self.make_room(&mut entries, &key);
        entries.insert(key, CacheEntry::new(value, self.ttl));
    }

    /// Return the live value for `key`, inserting `make()` when absent or expired.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers agree on the
    /// value.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        if !self.is_enabled() {
            return make();
        }

        let now = Instant::now();
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(&key) {
            if !entry.is_expired(now) {
                entry.last_accessed = now;
                return entry.value.clone();
            }
        }

        self.make_room(&mut entries, &key);
        let value = make();
        entries.insert(key, CacheEntry::new(value.clone(), self.ttl));
        value
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_room(&self, entries: &mut HashMap<K, CacheEntry<V>>, incoming: &K) {
        if entries.contains_key(incoming) || entries.len() < self.max_size {
            return;
        }

        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));

        if entries.len() >= self.max_size {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());

            if let Some(key) = lru_key {
                entries.remove(&key);
                debug!("Evicted LRU cache entry: {:?}", key);
            }
        }
    }
}

/// Single-flight memoization keyed by the raw input string.
///
/// The first call for an input runs the computation; calls arriving while it runs, or
/// until the window closes, receive a clone of the same outcome. Outcomes rejected by the
/// retention predicate are handed to the callers already waiting and then dropped, so the
/// next call runs again.
pub struct MemoCache<T> {
    slots: TtlCache<String, Arc<OnceCell<T>>>,
    retain: fn(&T) -> bool,
}

impl<T: Clone> MemoCache<T> {
    pub fn new(max_entries: usize, window: Duration) -> Self {
        Self {
            slots: TtlCache::new(max_entries, window),
            retain: |_| true,
        }
    }

    /// Only keep outcomes for which `retain` holds
    pub fn retain_when(mut self, retain: fn(&T) -> bool) -> Self {
        self.retain = retain;
        self
    }

    pub async fn get_or_run<F, Fut>(&self, input: &str, run: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.slots.is_enabled() {
            return run().await;
        }

        let key = input.to_string();
        let slot = self
            .slots
            .get_or_insert_with(key.clone(), || Arc::new(OnceCell::new()));

        if slot.initialized() {
            debug!(input = %input, "Memoized result reused");
        }

        let value = slot.get_or_init(run).await.clone();
        if !(self.retain)(&value) {
            if let Some(current) = self.slots.get(&key) {
                if Arc::ptr_eq(&current, &slot) {
                    self.slots.remove(&key);
                    debug!(input = %input, "Memoized result discarded");
                }
            }
        }
        value
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
