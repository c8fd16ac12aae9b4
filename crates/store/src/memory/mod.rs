//! In-process document store
//!
//! Backs tests and embedding callers that do not bring the managed vendor
//! store. All mutation primitives run under one write lock, so the
//! compare-and-set and create-if-absent guarantees hold even when two
//! tasks race on the same field.

use classquest_core::{Error, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::api::{DocumentStore, OrderBy, QueryFilter, Subscription};
use crate::document::{self, Document};

/// How many snapshots a slow subscriber may fall behind before skipping ahead
const CHANNEL_CAPACITY: usize = 64;

/// In-memory document store with per-document change feeds
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
    watchers: RwLock<HashMap<String, broadcast::Sender<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            watchers: RwLock::new(HashMap::new()),
        }
    }

    /// Create or replace a whole document
    ///
    /// Record creation is outside the engine's scope, so this lives on the
    /// concrete store rather than the `DocumentStore` trait.
    pub fn put_document(&self, collection: &str, id: &str, data: Value) {
        {
            let mut collections = self.lock_write();
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data.clone());
        }
        self.notify(collection, id, data);
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, HashMap<String, Value>>> {
        // A poisoned lock means a writer panicked mid-mutation; the data it
        // guards is plain JSON, so continuing with it is sound.
        self.collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, HashMap<String, Value>>> {
        self.collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn watch_key(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }

    fn notify(&self, collection: &str, id: &str, data: Value) {
        let watchers = self
            .watchers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tx) = watchers.get(&Self::watch_key(collection, id)) {
            // No receivers is fine; the send just drops
            let _ = tx.send(Document::new(id, data));
        }
    }

    fn missing(collection: &str, id: &str) -> Error {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.lock_read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn subscribe(&self, collection: &str, id: &str) -> Result<Subscription> {
        let mut watchers = self
            .watchers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = watchers
            .entry(Self::watch_key(collection, id))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(Subscription::new(tx.subscribe()))
    }

    async fn conditional_update(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        expected: Option<Value>,
        new_value: Value,
    ) -> Result<()> {
        let updated = {
            let mut collections = self.lock_write();
            let data = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| Self::missing(collection, id))?;

            let current = document::resolve(data, field_path);
            if current != expected.as_ref() {
                debug!(collection, id, field_path, "conditional update rejected");
                return Err(Error::Conflict {
                    field_path: field_path.to_string(),
                });
            }

            document::set(data, field_path, new_value)?;
            data.clone()
        };
        self.notify(collection, id, updated);
        Ok(())
    }

    async fn append_to_array(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        element: Value,
    ) -> Result<()> {
        let updated = {
            let mut collections = self.lock_write();
            let data = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| Self::missing(collection, id))?;

            match document::resolve(data, field_path) {
                None => {
                    document::set(data, field_path, Value::Array(vec![element]))?;
                }
                Some(Value::Array(existing)) => {
                    // Set-union semantics: a value-equal element is not re-added
                    if existing.contains(&element) {
                        return Ok(());
                    }
                    let mut appended = existing.clone();
                    appended.push(element);
                    document::set(data, field_path, Value::Array(appended))?;
                }
                Some(_) => {
                    return Err(Error::InvalidData(format!(
                        "Field '{}' is not an array",
                        field_path
                    )));
                }
            }
            data.clone()
        };
        self.notify(collection, id, updated);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<QueryFilter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>> {
        let collections = self.lock_read();
        let mut results: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| match &filter {
                        Some(QueryFilter::FieldEquals { path, value }) => {
                            document::resolve(data, path) == Some(value)
                        }
                        None => true,
                    })
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &order {
            results.sort_by(|a, b| {
                let ordering = compare_values(a.field(&order.path), b.field(&order.path));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        } else {
            // Deterministic output without an explicit order
            results.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Ok(results)
    }
}

/// Order JSON values for query sorting; absent fields sort last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_document("students", "s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conditional_update_applies_on_match() {
        let store = MemoryStore::new();
        store.put_document("students", "s-1", json!({"level": 0}));

        store
            .conditional_update("students", "s-1", "level", Some(json!(0)), json!(1))
            .await
            .unwrap();

        let doc = store.get_document("students", "s-1").await.unwrap().unwrap();
        assert_eq!(doc.field("level"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_conditional_update_conflicts_on_mismatch() {
        let store = MemoryStore::new();
        store.put_document("students", "s-1", json!({"level": 2}));

        let err = store
            .conditional_update("students", "s-1", "level", Some(json!(0)), json!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        // Losing the race must leave the field untouched
        let doc = store.get_document("students", "s-1").await.unwrap().unwrap();
        assert_eq!(doc.field("level"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_create_if_absent_then_conflict() {
        let store = MemoryStore::new();
        store.put_document("students", "s-1", json!({}));

        store
            .conditional_update(
                "students",
                "s-1",
                "emotionCheckins.2024-05-01",
                None,
                json!({"emotion": "happy"}),
            )
            .await
            .unwrap();

        // Second create-if-absent for the same key loses
        let err = store
            .conditional_update(
                "students",
                "s-1",
                "emotionCheckins.2024-05-01",
                None,
                json!({"emotion": "tired"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_conditional_update_missing_document() {
        let store = MemoryStore::new();
        let err = store
            .conditional_update("students", "ghost", "level", None, json!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_append_creates_array_and_dedupes() {
        let store = MemoryStore::new();
        store.put_document("students", "s-1", json!({}));

        let coupon = json!({"id": "c-1", "rewardKey": "snack-voucher"});
        store
            .append_to_array("students", "s-1", "coupons", coupon.clone())
            .await
            .unwrap();
        // Value-equal element is not re-added
        store
            .append_to_array("students", "s-1", "coupons", coupon.clone())
            .await
            .unwrap();
        store
            .append_to_array("students", "s-1", "coupons", json!({"id": "c-2"}))
            .await
            .unwrap();

        let doc = store.get_document("students", "s-1").await.unwrap().unwrap();
        assert_eq!(doc.field("coupons").unwrap().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_sees_updates() {
        let store = MemoryStore::new();
        store.put_document("students", "s-1", json!({"level": 0}));

        let mut sub = store.subscribe("students", "s-1").await.unwrap();
        store
            .conditional_update("students", "s-1", "level", Some(json!(0)), json!(1))
            .await
            .unwrap();

        let doc = sub.changed().await.unwrap();
        assert_eq!(doc.field("level"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new();
        store.put_document("students", "a", json!({"level": 1, "classId": "3-2"}));
        store.put_document("students", "b", json!({"level": 4, "classId": "3-2"}));
        store.put_document("students", "c", json!({"level": 2, "classId": "4-1"}));

        let rows = store
            .query(
                "students",
                Some(QueryFilter::FieldEquals {
                    path: "classId".to_string(),
                    value: json!("3-2"),
                }),
                Some(OrderBy::descending("level")),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = rows.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
