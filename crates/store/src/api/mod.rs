//! The document store collaborator interface
//!
//! The backing database is an external, schema-less document store with
//! get/subscribe/query/conditional-update operations. This module defines
//! the trait this repository programs against; `MemoryStore` is the
//! in-process implementation, production backends live out of tree.

use classquest_core::{Error, Result};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::document::Document;

/// Field-level filter for `query`
#[derive(Debug, Clone)]
pub enum QueryFilter {
    /// Keep documents whose value at `path` equals `value`
    FieldEquals { path: String, value: Value },
}

/// Single-field ordering for `query`
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub path: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn descending(path: &str) -> Self {
        Self {
            path: path.to_string(),
            descending: true,
        }
    }

    pub fn ascending(path: &str) -> Self {
        Self {
            path: path.to_string(),
            descending: false,
        }
    }
}

/// A push-based change feed for one document
///
/// Dropping the subscription unsubscribes. A receiver that falls behind
/// skips to the newest snapshot rather than erroring.
pub struct Subscription {
    rx: broadcast::Receiver<Document>,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<Document>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot of the subscribed document
    pub async fn changed(&mut self) -> Result<Document> {
        loop {
            match self.rx.recv().await {
                Ok(doc) => return Ok(doc),
                // Lagged: older snapshots were dropped; keep going, the
                // next recv returns the newest retained one
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(Error::StoreUnavailable(
                        "subscription closed by the store".to_string(),
                    ))
                }
            }
        }
    }
}

/// Abstract operations the engine requires from the document store
///
/// Writes are serialized per document with last-write-wins semantics per
/// field path; `conditional_update` is the only stronger primitive and is
/// what every at-most-once guarantee in the engine rides on.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetch one document snapshot; `None` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Open a push-based change feed for one document
    async fn subscribe(&self, collection: &str, id: &str) -> Result<Subscription>;

    /// Compare-and-set the value at `field_path`
    ///
    /// `expected = None` means the field must currently be absent
    /// (create-if-absent). Returns `Error::Conflict` when the current
    /// value does not match `expected`.
    async fn conditional_update(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        expected: Option<Value>,
        new_value: Value,
    ) -> Result<()>;

    /// Append `element` to the array at `field_path`, creating the array
    /// if absent
    ///
    /// Set-union semantics: an element equal by value to one already in
    /// the array is not re-added.
    async fn append_to_array(
        &self,
        collection: &str,
        id: &str,
        field_path: &str,
        element: Value,
    ) -> Result<()>;

    /// Fetch all documents in a collection matching `filter`, ordered by
    /// `order` when given
    async fn query(
        &self,
        collection: &str,
        filter: Option<QueryFilter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>>;
}
