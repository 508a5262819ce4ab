use super::{BatchWrite, ChangeEvent, Document, DocumentStore, CHANGE_FEED_CAPACITY};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// In-process document store.
///
/// Collections are kept as insertion-ordered vectors. Used by the test suite
/// and by `STORE=memory` local runs; contents are lost on exit.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    changes: broadcast::Sender<ChangeEvent>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of write calls attempted against this store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of live change-feed receivers.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, collection: &str) {
        // No receivers is not an error.
        let _ = self.changes.send(ChangeEvent {
            collection: collection.to_string(),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.record_write();
        let document = Document::new(uuid::Uuid::new_v4().simple().to_string(), data);
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .push(document.clone());
        }
        debug!("Inserted {}/{}", collection, document.id);
        self.notify(collection);
        Ok(document)
    }

    async fn overwrite(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        self.record_write();
        let found = {
            let mut collections = self.collections.write().await;
            match collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            {
                Some(doc) => {
                    doc.data = data;
                    true
                }
                None => false,
            }
        };
        if found {
            self.notify(collection);
        }
        Ok(found)
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        self.record_write();
        let found = {
            let mut collections = self.collections.write().await;
            match collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            {
                Some(doc) => {
                    doc.data.extend(fields);
                    true
                }
                None => false,
            }
        };
        if found {
            self.notify(collection);
        }
        Ok(found)
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.record_write();
        {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.iter_mut().find(|doc| doc.id == id) {
                Some(doc) => doc.data.extend(fields),
                None => docs.push(Document::new(id, fields)),
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.record_write();
        let removed = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|doc| doc.id != id);
                    docs.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.notify(collection);
        }
        Ok(removed)
    }

    async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<usize, StoreError> {
        self.record_write();
        let count = writes.len();
        let mut touched: Vec<String> = Vec::new();
        {
            let mut collections = self.collections.write().await;
            for write in writes {
                let docs = collections.entry(write.collection.clone()).or_default();
                match docs.iter_mut().find(|doc| doc.id == write.document.id) {
                    Some(doc) => doc.data = write.document.data,
                    None => docs.push(write.document),
                }
                if !touched.contains(&write.collection) {
                    touched.push(write.collection);
                }
            }
        }
        for collection in &touched {
            self.notify(collection);
        }
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
