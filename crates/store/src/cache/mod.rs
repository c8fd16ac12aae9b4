//! Advisory read-through caching for document snapshots
//!
//! The store is the single source of truth. This cache only trims repeat
//! reads on view paths; every write path invalidates, and nothing that
//! needs an at-most-once guarantee ever consults it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use classquest_core::Result;

use crate::api::{DocumentStore, OrderBy, QueryFilter, Subscription};
use crate::document::Document;

/// Cached item with expiration
struct CacheEntry {
    value: Document,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe snapshot cache with TTL and max-entry bounds
pub struct DocumentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl DocumentCache {
    /// Create a new cache with default TTL and max entry count
    pub fn with_capacity(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries,
        }
    }

    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, 500)
    }

    fn key(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }

    /// Get a snapshot from cache if not expired
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&Self::key(collection, id))?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Insert or update a snapshot, evicting if at capacity
    pub fn insert(&self, collection: &str, id: &str, doc: Document) {
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.max_entries {
                entries.retain(|_, entry| !entry.is_expired());
            }

            // If still at capacity after cleanup, evict oldest
            if entries.len() >= self.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest_key);
                }
            }

            entries.insert(
                Self::key(collection, id),
                CacheEntry {
                    value: doc,
                    inserted_at: Instant::now(),
                    ttl: self.default_ttl,
                },
            );
        }
    }

    /// Drop a snapshot (e.g., after a write changed the document)
    pub fn invalidate(&self, collection: &str, id: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(&Self::key(collection, id));
        }
    }

    /// Clear all expired entries
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Clear entire cache
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        // Snapshots go stale fast while a class is active
        Self::with_capacity(Duration::from_secs(30), 500)
    }
}

/// Read-through wrapper adding the advisory cache to any store
pub struct CachedStore<S> {
    inner: S,
    cache: DocumentCache,
}

impl<S> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: DocumentCache::default(),
        }
    }

    pub fn with_cache(inner: S, cache: DocumentCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }
}

impl<S: DocumentStore> DocumentStore for CachedStore<S> {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        if let Some(doc) = self.cache.get(collection, id) {
            return Ok(Some(doc));
        }
        let fetched = self.inner.get_document(collection, id).await?;
        if let Some(doc) = &fetched {
            self.cache.insert(collection, id, doc.clone());
        }
        Ok(fetched)
    }

    async fn subscribe(&self, collection: &str, id: &str) -> Result<Subscription> {
        self.inner.subscribe(collection, id).await
    }

    async fn conditional_update(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        expected: Option<Value>,
        new_value: Value,
    ) -> Result<()> {
        // Correctness comes from the store's compare-and-set, never from
        // cached state; drop the snapshot whether or not the write wins
        self.cache.invalidate(collection, id);
        self.inner
            .conditional_update(collection, id, field_path, expected, new_value)
            .await
    }

    async fn append_to_array(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        element: Value,
    ) -> Result<()> {
        self.cache.invalidate(collection, id);
        self.inner
            .append_to_array(collection, id, field_path, element)
            .await
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<QueryFilter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>> {
        self.inner.query(collection, filter, order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = DocumentCache::new(Duration::from_millis(10));
        cache.insert("students", "s-1", Document::new("s-1", json!({"level": 1})));
        assert!(cache.get("students", "s-1").is_some());

        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("students", "s-1").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = DocumentCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("students", "a", Document::new("a", json!({})));
        cache.insert("students", "b", Document::new("b", json!({})));
        cache.insert("students", "c", Document::new("c", json!({})));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("students", "a").is_none());
        assert!(cache.get("students", "c").is_some());
    }

    #[tokio::test]
    async fn test_read_through_and_write_invalidation() {
        let store = CachedStore::new(MemoryStore::new());
        store
            .inner
            .put_document("students", "s-1", json!({"level": 0}));

        // First read populates the cache
        store.get_document("students", "s-1").await.unwrap();
        assert!(store.cache().get("students", "s-1").is_some());

        // A write drops the snapshot, so the next read sees fresh state
        store
            .conditional_update("students", "s-1", "level", Some(json!(0)), json!(1))
            .await
            .unwrap();
        assert!(store.cache().get("students", "s-1").is_none());

        let doc = store.get_document("students", "s-1").await.unwrap().unwrap();
        assert_eq!(doc.field("level"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_stale_cache_never_decides_a_cas() {
        let store = CachedStore::new(MemoryStore::new());
        store
            .inner
            .put_document("students", "s-1", json!({"levelRewardDrawn": {}}));

        // Warm the cache, then let another writer win directly on the inner store
        store.get_document("students", "s-1").await.unwrap();
        store
            .inner
            .conditional_update("students", "s-1", "levelRewardDrawn.2", None, json!(true))
            .await
            .unwrap();

        // The cached (stale) snapshot says undrawn, but the CAS still loses
        let err = store
            .conditional_update("students", "s-1", "levelRewardDrawn.2", None, json!(true))
            .await
            .unwrap_err();
        assert!(matches!(err, classquest_core::Error::Conflict { .. }));
    }
}
