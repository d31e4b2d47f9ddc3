//! Tag-addressable cache for resolved configuration.
//!
//! Cached results are keyed per tenant view and tagged with every scope they
//! were resolved from. Writes invalidate by tag before returning, so a read
//! after a write in the same request sees the new value.
//!
//! The cache is never required for correctness: backend failures on reads
//! fall through to the store, and a failed invalidation clears the backend or,
//! failing that, bypasses it until a later clear succeeds.

pub mod memory;

pub use memory::{FailingCacheBackend, MemoryCacheBackend};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use domain::models::{ChangeEvent, TenantId};
use domain::services::{cache_key, change_tags, read_tags, CacheSubject, CacheTag};

use crate::metrics::{record_cache_event, CacheEvent};

/// Errors raised by cache backends. They never escape a read.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of evictions due to capacity or expiry.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Storage for serialized cached results.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a cached value by key.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value under `key`, tagged with `tags`. Replaces any previous value.
    async fn put(&self, key: &str, tags: &BTreeSet<CacheTag>, value: String) -> Result<(), CacheError>;

    /// Remove every entry whose tag set intersects `tags`. Returns the number removed.
    async fn invalidate(&self, tags: &BTreeSet<CacheTag>) -> Result<u64, CacheError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Configuration for the cache layer.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Optional expiry on top of tag invalidation.
    pub safety_ttl: Option<Duration>,
    /// Capacity; the oldest entry is evicted when full.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            safety_ttl: None,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.safety_ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

fn subject_label(subject: CacheSubject<'_>) -> &'static str {
    match subject {
        CacheSubject::Setting(_) => "setting",
        CacheSubject::FieldDefinitions(_) => "custom_fields",
        CacheSubject::EnumDefinition(_) => "dynamic_enum",
        CacheSubject::EnumCatalog => "dynamic_enums",
    }
}

/// Read-through cache in front of the override store.
pub struct CacheLayer {
    backend: Option<Arc<dyn CacheBackend>>,
    /// Set when an invalidation could neither remove the tagged entries nor
    /// clear the backend; reads skip the cache until a clear succeeds.
    bypassed: AtomicBool,
    /// Bumped on every invalidation; a result computed across a bump is not stored.
    generation: AtomicU64,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
            bypassed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// A pass-through layer that never caches.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            bypassed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Builds an in-memory cache layer, or a disabled one.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(Arc::new(MemoryCacheBackend::new(config)))
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed.load(Ordering::Acquire)
    }

    fn active_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        self.backend.as_ref().filter(|_| !self.is_bypassed())
    }

    /// Returns the cached result for `subject` in the tenant view, or runs
    /// `compute` and caches its result.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        tenant: Option<TenantId>,
        subject: CacheSubject<'_>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(backend) = self.active_backend() else {
            return compute().await;
        };
        let key = cache_key(tenant, subject);
        let label = subject_label(subject);

        match backend.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(cache_key = %key, "Cache hit");
                    record_cache_event(CacheEvent::Hit, label);
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Discarding undecodable cache entry");
                    record_cache_event(CacheEvent::Error, label);
                }
            },
            Ok(None) => {
                tracing::debug!(cache_key = %key, "Cache miss");
                record_cache_event(CacheEvent::Miss, label);
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache read failed, reading from store");
                record_cache_event(CacheEvent::Error, label);
                return compute().await;
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let value = compute().await?;
        if self.generation.load(Ordering::Acquire) != generation || self.is_bypassed() {
            return Ok(value);
        }

        let tags = read_tags(tenant, subject);
        let stored = match serde_json::to_string(&value) {
            Ok(raw) => backend.put(&key, &tags, raw).await,
            Err(e) => Err(CacheError::Serialization(e.to_string())),
        };
        match stored {
            Ok(()) => {
                // A write may have invalidated between the check and the put.
                if self.generation.load(Ordering::Acquire) != generation {
                    if let Err(e) = backend.invalidate(&tags).await {
                        tracing::error!(cache_key = %key, error = %e, "Cache invalidation failed, clearing cache");
                        record_cache_event(CacheEvent::Error, label);
                        self.clear_or_bypass(backend.as_ref()).await;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache write failed");
                record_cache_event(CacheEvent::Error, label);
            }
        }
        Ok(value)
    }

    /// Removes every cached result whose tags intersect `tags`.
    pub async fn invalidate(&self, tags: &BTreeSet<CacheTag>) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let Some(backend) = &self.backend else {
            return;
        };

        if self.is_bypassed() {
            self.clear_or_bypass(backend.as_ref()).await;
            return;
        }

        match backend.invalidate(tags).await {
            Ok(removed) => {
                tracing::debug!(tags = ?tags, removed = removed, "Cache invalidated");
                record_cache_event(CacheEvent::Invalidation, "tags");
            }
            Err(e) => {
                tracing::error!(tags = ?tags, error = %e, "Cache invalidation failed, clearing cache");
                record_cache_event(CacheEvent::Error, "tags");
                self.clear_or_bypass(backend.as_ref()).await;
            }
        }
    }

    async fn clear_or_bypass(&self, backend: &dyn CacheBackend) {
        match backend.clear().await {
            Ok(()) => {
                if self.bypassed.swap(false, Ordering::AcqRel) {
                    tracing::info!("Cache cleared, resuming cached reads");
                }
            }
            Err(e) => {
                if !self.bypassed.swap(true, Ordering::AcqRel) {
                    tracing::error!(error = %e, "Cache clear failed, bypassing cache");
                }
                record_cache_event(CacheEvent::Error, "clear");
            }
        }
    }

    /// Invalidates the tags derived from a change event.
    pub async fn apply(&self, event: &ChangeEvent) {
        self.invalidate(&change_tags(event)).await;
    }

    /// Invalidates the union of tags derived from several change events.
    pub async fn apply_all(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let tags: BTreeSet<CacheTag> = events.iter().flat_map(change_tags).collect();
        self.invalidate(&tags).await;
    }

    /// Backend statistics; `None` when disabled or unavailable.
    pub async fn stats(&self) -> Option<CacheStats> {
        match &self.backend {
            Some(backend) => backend.stats().await.ok(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{Scope, TargetType};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;
    use uuid::Uuid;

    /// Memory backend with switchable invalidate and clear failures. With
    /// `hold_put` set, the next put waits for `put_resume` before storing.
    struct FlakyBackend {
        inner: MemoryCacheBackend,
        fail_invalidate: AtomicBool,
        fail_clear: AtomicBool,
        hold_put: AtomicBool,
        put_entered: Notify,
        put_resume: Notify,
    }

    impl FlakyBackend {
        fn new() -> Self {
            Self {
                inner: MemoryCacheBackend::new(&CacheConfig::default()),
                fail_invalidate: AtomicBool::new(false),
                fail_clear: AtomicBool::new(false),
                hold_put: AtomicBool::new(false),
                put_entered: Notify::new(),
                put_resume: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl CacheBackend for FlakyBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, tags: &BTreeSet<CacheTag>, value: String) -> Result<(), CacheError> {
            if self.hold_put.swap(false, Ordering::SeqCst) {
                self.put_entered.notify_one();
                self.put_resume.notified().await;
            }
            self.inner.put(key, tags, value).await
        }

        async fn invalidate(&self, tags: &BTreeSet<CacheTag>) -> Result<u64, CacheError> {
            if self.fail_invalidate.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("invalidate".to_string()));
            }
            self.inner.invalidate(tags).await
        }

        async fn clear(&self) -> Result<(), CacheError> {
            if self.fail_clear.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("clear".to_string()));
            }
            self.inner.clear().await
        }

        async fn stats(&self) -> Result<CacheStats, CacheError> {
            self.inner.stats().await
        }
    }

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    async fn read(layer: &CacheLayer, tenant: Option<TenantId>, value: &str, calls: &AtomicUsize) -> String {
        layer
            .get_or_compute(tenant, CacheSubject::Setting("system.gdpr"), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(value.to_string())
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let layer = CacheLayer::from_config(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let t = Some(tenant());

        assert_eq!(read(&layer, t, "first", &calls).await, "first");
        assert_eq!(read(&layer, t, "second", &calls).await, "first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = layer.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_global_write_invalidates_every_tenant_view() {
        let layer = CacheLayer::from_config(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let (t1, t2) = (Some(tenant()), Some(tenant()));

        read(&layer, t1, "old", &calls).await;
        read(&layer, t2, "old", &calls).await;
        layer
            .apply(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)))
            .await;

        assert_eq!(read(&layer, t1, "new", &calls).await, "new");
        assert_eq!(read(&layer, t2, "new", &calls).await, "new");
    }

    #[tokio::test]
    async fn test_tenant_write_keeps_other_tenants_cached() {
        let layer = CacheLayer::from_config(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let t1 = tenant();
        let t2 = Some(tenant());

        read(&layer, Some(t1), "old", &calls).await;
        read(&layer, t2, "old", &calls).await;
        layer
            .apply(&ChangeEvent::setting("system.gdpr", Scope::Tenant(t1), Some(1)))
            .await;

        assert_eq!(read(&layer, Some(t1), "new", &calls).await, "new");
        assert_eq!(read(&layer, t2, "new", &calls).await, "old");
    }

    #[tokio::test]
    async fn test_failing_backend_degrades_to_compute() {
        let layer = CacheLayer::new(Arc::new(FailingCacheBackend::new()));
        let calls = AtomicUsize::new(0);

        assert_eq!(read(&layer, None, "a", &calls).await, "a");
        assert_eq!(read(&layer, None, "b", &calls).await, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_invalidation_falls_back_to_clear() {
        let backend = Arc::new(FlakyBackend::new());
        let layer = CacheLayer::new(backend.clone());
        let calls = AtomicUsize::new(0);

        read(&layer, None, "old", &calls).await;
        backend.fail_invalidate.store(true, Ordering::SeqCst);
        layer
            .apply(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)))
            .await;

        assert!(!layer.is_bypassed());
        assert_eq!(read(&layer, None, "new", &calls).await, "new");
    }

    #[tokio::test]
    async fn test_failed_clear_bypasses_until_recovered() {
        let backend = Arc::new(FlakyBackend::new());
        let layer = CacheLayer::new(backend.clone());
        let calls = AtomicUsize::new(0);

        read(&layer, None, "old", &calls).await;
        backend.fail_invalidate.store(true, Ordering::SeqCst);
        backend.fail_clear.store(true, Ordering::SeqCst);
        layer
            .apply(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)))
            .await;

        assert!(layer.is_bypassed());
        // The stale entry is still in the backend but is not served.
        assert_eq!(read(&layer, None, "new", &calls).await, "new");

        backend.fail_clear.store(false, Ordering::SeqCst);
        layer
            .apply(&ChangeEvent::setting("system.otp", Scope::Global, Some(1)))
            .await;
        assert!(!layer.is_bypassed());
        assert_eq!(read(&layer, None, "newer", &calls).await, "newer");
    }

    #[tokio::test]
    async fn test_write_during_put_never_leaves_stale_entry() {
        let backend = Arc::new(FlakyBackend::new());
        let layer = CacheLayer::new(backend.clone());
        let calls = AtomicUsize::new(0);
        backend.hold_put.store(true, Ordering::SeqCst);

        let writer = async {
            backend.put_entered.notified().await;
            layer
                .apply(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)))
                .await;
            // The re-check after the held put now fails to invalidate.
            backend.fail_invalidate.store(true, Ordering::SeqCst);
            backend.put_resume.notify_one();
        };
        let (stale, ()) = tokio::join!(read(&layer, None, "stale", &calls), writer);
        assert_eq!(stale, "stale");

        backend.fail_invalidate.store(false, Ordering::SeqCst);
        assert!(!layer.is_bypassed());
        assert_eq!(read(&layer, None, "fresh", &calls).await, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_write_during_put_bypasses_when_clear_fails() {
        let backend = Arc::new(FlakyBackend::new());
        let layer = CacheLayer::new(backend.clone());
        let calls = AtomicUsize::new(0);
        backend.hold_put.store(true, Ordering::SeqCst);

        let writer = async {
            backend.put_entered.notified().await;
            layer
                .apply(&ChangeEvent::setting("system.gdpr", Scope::Global, Some(2)))
                .await;
            backend.fail_invalidate.store(true, Ordering::SeqCst);
            backend.fail_clear.store(true, Ordering::SeqCst);
            backend.put_resume.notify_one();
        };
        tokio::join!(read(&layer, None, "stale", &calls), writer);

        assert!(layer.is_bypassed());
        assert_eq!(read(&layer, None, "fresh", &calls).await, "fresh");
    }

    #[tokio::test]
    async fn test_disabled_layer_always_computes() {
        let layer = CacheLayer::from_config(&CacheConfig::default().disabled());
        let calls = AtomicUsize::new(0);

        read(&layer, None, "a", &calls).await;
        read(&layer, None, "a", &calls).await;
        assert!(!layer.is_enabled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(layer.stats().await.is_none());
    }

    #[tokio::test]
    async fn test_compute_errors_are_not_cached() {
        let layer = CacheLayer::from_config(&CacheConfig::default());
        let failed: Result<String, &str> = layer
            .get_or_compute(None, CacheSubject::EnumCatalog, || async { Err("store down") })
            .await;
        assert!(failed.is_err());

        let ok: Result<String, &str> = layer
            .get_or_compute(None, CacheSubject::EnumCatalog, || async { Ok("listed".to_string()) })
            .await;
        assert_eq!(ok.unwrap(), "listed");
    }

    #[tokio::test]
    async fn test_field_change_flushes_target_type_lists() {
        let layer = CacheLayer::from_config(&CacheConfig::default());
        let subject = CacheSubject::FieldDefinitions(TargetType::Student);
        let t = Some(tenant());

        let _: Result<Vec<String>, ()> = layer
            .get_or_compute(t, subject, || async { Ok(vec!["old".to_string()]) })
            .await;
        layer
            .apply_all(&[ChangeEvent::field("photo", Scope::Global, TargetType::Student)])
            .await;
        let fresh: Result<Vec<String>, ()> = layer
            .get_or_compute(t, subject, || async { Ok(vec!["new".to_string()]) })
            .await;
        assert_eq!(fresh.unwrap(), vec!["new".to_string()]);
    }
}
