//! Document storage: the `DocumentStore` seam and its backends.
//!
//! Documents are open JSON maps grouped into named collections. The store
//! keeps no notion of display order; it only guarantees that `list` returns
//! documents in insertion order. Every successful write publishes a
//! `ChangeEvent` on the store's broadcast channel so live views can refresh.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Capacity of the change-feed channel before slow receivers start lagging.
pub const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Notification that something in `collection` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
}

/// One upsert inside an atomic batch.
#[derive(Debug, Clone)]
pub struct BatchWrite {
    pub collection: String,
    pub document: Document,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in insertion order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert a new document under a store-generated id.
    async fn insert(&self, collection: &str, data: Map<String, Value>)
        -> Result<Document, StoreError>;

    /// Replace the whole body of an existing document. Returns false if absent.
    async fn overwrite(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Set the given top-level fields on an existing document. Returns false if absent.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Merge fields into a document, creating it when missing.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Returns false if the document did not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Upsert every write or none of them.
    async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<usize, StoreError>;

    /// Receiver for change notifications across all collections.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
