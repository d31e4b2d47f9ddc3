//! In-process cache backends.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use domain::services::CacheTag;

use super::{CacheBackend, CacheConfig, CacheError, CacheStats};

struct CachedEntry {
    value: String,
    tags: BTreeSet<CacheTag>,
    cached_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct Entries {
    by_key: HashMap<String, CachedEntry>,
    by_tag: HashMap<CacheTag, HashSet<String>>,
    /// Insertion order for capacity eviction.
    by_age: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Entries {
    fn remove(&mut self, key: &str) -> bool {
        let Some(entry) = self.by_key.remove(key) else {
            return false;
        };
        self.by_age.remove(&entry.seq);
        for tag in &entry.tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
        true
    }

    fn oldest_key(&self) -> Option<String> {
        self.by_age.first_key_value().map(|(_, key)| key.clone())
    }

    fn insert(&mut self, key: &str, tags: &BTreeSet<CacheTag>, value: String) {
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_age.insert(seq, key.to_string());
        self.by_key.insert(
            key.to_string(),
            CachedEntry {
                value,
                tags: tags.clone(),
                cached_at: Instant::now(),
                seq,
            },
        );
    }

    fn clear(&mut self) {
        self.by_key.clear();
        self.by_tag.clear();
        self.by_age.clear();
    }
}

/// Map-backed cache with a tag index, optional safety TTL and bounded size.
pub struct MemoryCacheBackend {
    entries: RwLock<Entries>,
    safety_ttl: Option<Duration>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCacheBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            safety_ttl: config.safety_ttl,
            max_entries: config.max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, entry: &CachedEntry) -> bool {
        self.safety_ttl
            .map(|ttl| entry.cached_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.by_key.get(key) {
                Some(entry) if !self.is_expired(entry) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }

        // Expired: drop it under the write lock.
        let mut entries = self.entries.write().await;
        let expired = entries
            .by_key
            .get(key)
            .map(|entry| self.is_expired(entry))
            .unwrap_or(false);
        if expired && entries.remove(key) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn put(&self, key: &str, tags: &BTreeSet<CacheTag>, value: String) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);

        if entries.by_key.len() >= self.max_entries {
            if let Some(oldest) = entries.oldest_key() {
                entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        entries.insert(key, tags, value);
        Ok(())
    }

    async fn invalidate(&self, tags: &BTreeSet<CacheTag>) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let keys: HashSet<String> = tags
            .iter()
            .filter_map(|tag| entries.by_tag.get(tag))
            .flatten()
            .cloned()
            .collect();

        let mut removed = 0;
        for key in keys {
            if entries.remove(&key) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.entries.read().await;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entries.by_key.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}

/// Backend that is always unavailable. Used to exercise degradation.
#[derive(Debug, Clone, Default)]
pub struct FailingCacheBackend;

impl FailingCacheBackend {
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>() -> Result<T, CacheError> {
        Err(CacheError::Unavailable("simulated outage".to_string()))
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Self::unavailable()
    }

    async fn put(&self, _key: &str, _tags: &BTreeSet<CacheTag>, _value: String) -> Result<(), CacheError> {
        Self::unavailable()
    }

    async fn invalidate(&self, _tags: &BTreeSet<CacheTag>) -> Result<u64, CacheError> {
        Self::unavailable()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Self::unavailable()
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Self::unavailable()
    }
}
