//! Ordered collections: a user-defined display order over unordered storage.
//!
//! The store returns documents in fetch order only. Display order is the
//! stable sort of entries by their `order` rank, a missing rank counting as 0.
//! New entries get no rank, so they sort at the top until moved.

use crate::db::{ChangeEvent, Document, DocumentStore};
use crate::error::{CmsError, Result, StoreError};
use crate::export::{self, ExportFile};
use crate::i18n::{Language, LanguageStrings};
use crate::models::{CollectionKind, PRIMARY_FIELD};
use chrono::Utc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

/// One record of an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_rank"
    )]
    pub order: Option<f64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    /// Sort key; entries without an explicit rank sort as 0.
    pub fn rank(&self) -> f64 {
        self.order.unwrap_or(0.0)
    }

    fn from_document(document: Document) -> Self {
        let Document { id, mut data } = document;
        data.remove("id");

        let order = match data.remove("order") {
            Some(value) => match value.as_f64().filter(|order| order.is_finite()) {
                Some(order) => Some(order),
                None => {
                    if !value.is_null() {
                        data.insert("order".to_string(), value);
                    }
                    None
                }
            },
            None => None,
        };

        Entry {
            id,
            order,
            fields: data,
        }
    }

    pub(crate) fn into_document(self) -> Document {
        let mut data = self.fields;
        if let Some(order) = self.order {
            data.insert("order".to_string(), rank_value(order));
        }
        Document::new(self.id, data)
    }
}

/// JSON form of a rank; whole numbers stay integers.
fn rank_value(order: f64) -> Value {
    if order.fract() == 0.0 && order.abs() < i64::MAX as f64 {
        Value::from(order as i64)
    } else {
        Value::from(order)
    }
}

fn serialize_rank<S: serde::Serializer>(
    order: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match order {
        Some(order) => rank_value(*order).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Stable sort by rank; ties keep their fetch order.
pub fn sort_for_display(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.rank().total_cmp(&b.rank()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Answer to the "are you sure?" prompt that guards deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoveOutcome {
    Deleted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReorderOutcome {
    Moved { from: usize, to: usize },
    Unchanged,
}

/// Handle to one collection of a document store.
#[derive(Clone)]
pub struct OrderedCollection {
    store: Arc<dyn DocumentStore>,
    kind: CollectionKind,
}

impl OrderedCollection {
    pub fn new(store: Arc<dyn DocumentStore>, kind: CollectionKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// All entries in display order.
    pub async fn list(&self) -> Result<Vec<Entry>> {
        let documents = self.store.list(self.name()).await?;
        let mut entries: Vec<Entry> = documents.into_iter().map(Entry::from_document).collect();
        sort_for_display(&mut entries);
        Ok(entries)
    }

    pub async fn get(&self, id: &str) -> Result<Entry> {
        self.store
            .get(self.name(), id)
            .await?
            .map(Entry::from_document)
            .ok_or_else(|| CmsError::not_found(self.name(), id))
    }

    /// Live view: yields the current sorted list, then a fresh one after
    /// every change to this collection.
    pub fn subscribe(&self) -> Subscription {
        debug!("Subscribed to {}", self.name());
        Subscription {
            changes: self.store.subscribe(),
            collection: self.clone(),
            primed: false,
        }
    }

    /// Create an entry. The canonical-language title is required; no rank is
    /// assigned unless the caller supplies one.
    pub async fn add(&self, mut fields: Map<String, Value>) -> Result<Entry> {
        fields.remove("id");

        let has_title = fields
            .get(PRIMARY_FIELD)
            .and_then(Value::as_str)
            .map(|title| !title.trim().is_empty())
            .unwrap_or(false);
        if !has_title {
            warn!("Rejected {} entry without a title", self.name());
            return Err(CmsError::Validation(
                LanguageStrings::for_language(Language::canonical())
                    .admin_title_required
                    .to_string(),
            ));
        }

        self.kind.validate(&fields)?;

        fields
            .entry("createdAt")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let document = self.store.insert(self.name(), fields).await.map_err(|e| {
            error!("Error adding {} entry: {}", self.name(), e);
            e
        })?;

        let entry = Entry::from_document(document);
        info!("Added {}/{}", self.name(), entry.id);
        Ok(entry)
    }

    /// Overwrite every mutable field of `id`. The stored rank is kept when the
    /// payload carries none.
    pub async fn update(&self, id: &str, mut fields: Map<String, Value>) -> Result<Entry> {
        fields.remove("id");
        self.kind.validate(&fields)?;

        let existing = self.get(id).await?;
        if !fields.contains_key("order") {
            if let Some(order) = existing.order {
                fields.insert("order".to_string(), rank_value(order));
            }
        }

        let written = self
            .store
            .overwrite(self.name(), id, fields.clone())
            .await
            .map_err(|e| {
                error!("Error updating {}/{}: {}", self.name(), id, e);
                e
            })?;
        if !written {
            return Err(CmsError::not_found(self.name(), id));
        }

        info!("Updated {}/{}", self.name(), id);
        Ok(Entry::from_document(Document::new(id, fields)))
    }

    /// Delete `id` once the caller has confirmed. Declining issues no write.
    pub async fn remove(&self, id: &str, confirmation: Confirmation) -> Result<RemoveOutcome> {
        if confirmation == Confirmation::Declined {
            debug!("Delete of {}/{} cancelled", self.name(), id);
            return Ok(RemoveOutcome::Cancelled);
        }

        if !self.store.delete(self.name(), id).await? {
            return Err(CmsError::not_found(self.name(), id));
        }

        info!("Deleted {}/{}", self.name(), id);
        Ok(RemoveOutcome::Deleted)
    }

    /// Swap `id` with its neighbour in display order.
    ///
    /// Ranks are rewritten to the two display positions rather than exchanged,
    /// so entries sharing a rank still move. The two writes are independent.
    pub async fn reorder(&self, id: &str, direction: Direction) -> Result<ReorderOutcome> {
        let entries = self.list().await?;
        let index = entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| CmsError::not_found(self.name(), id))?;

        let target = match direction {
            Direction::Up if index == 0 => return Ok(ReorderOutcome::Unchanged),
            Direction::Up => index - 1,
            Direction::Down if index + 1 >= entries.len() => return Ok(ReorderOutcome::Unchanged),
            Direction::Down => index + 1,
        };
        let displaced = &entries[target].id;

        if !self.set_order(id, target).await? {
            return Err(CmsError::not_found(self.name(), id));
        }

        match self.set_order(displaced, index).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "{}/{} disappeared during reorder; only {} was moved",
                    self.name(),
                    displaced,
                    id
                );
            }
            Err(e) => {
                error!(
                    "Partial reorder in {}: {} now at {}, {} still needs order {}: {}",
                    self.name(),
                    id,
                    target,
                    displaced,
                    index,
                    e
                );
                return Err(CmsError::PartialReorder {
                    collection: self.name().to_string(),
                    moved: id.to_string(),
                    displaced: displaced.clone(),
                    source: e,
                });
            }
        }

        info!("Moved {}/{} from {} to {}", self.name(), id, index, target);
        Ok(ReorderOutcome::Moved {
            from: index,
            to: target,
        })
    }

    async fn set_order(&self, id: &str, order: usize) -> std::result::Result<bool, StoreError> {
        let mut fields = Map::new();
        fields.insert("order".to_string(), Value::from(order as i64));
        self.store.patch(self.name(), id, fields).await
    }

    /// Upsert previously exported entries with their ids, in one store batch.
    pub async fn import(&self, entries: &[Entry]) -> Result<usize> {
        let writes = export::batch_writes(self.kind, entries)?;
        let count = self.store.write_batch(writes).await.map_err(|e| {
            error!("Error importing into {}: {}", self.name(), e);
            e
        })?;
        info!("Imported {} entries into {}", count, self.name());
        Ok(count)
    }

    /// Snapshot of the current list as a downloadable JSON document.
    pub async fn export(&self) -> Result<ExportFile> {
        let entries = self.list().await?;
        export::export_entries(self.name(), &entries)
    }
}

/// Scoped live view of one collection.
///
/// Holds a change-feed receiver for its lifetime; dropping it (or calling
/// [`Subscription::unsubscribe`]) releases the receiver.
pub struct Subscription {
    collection: OrderedCollection,
    changes: broadcast::Receiver<ChangeEvent>,
    primed: bool,
}

impl Subscription {
    /// Next full snapshot, or `None` once the store's change feed is closed.
    pub async fn next(&mut self) -> Option<Result<Vec<Entry>>> {
        if !self.primed {
            self.primed = true;
            return Some(self.collection.list().await);
        }

        loop {
            match self.changes.recv().await {
                Ok(event) if event.collection == self.collection.name() => {
                    return Some(self.collection.list().await);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(
                        "{} subscriber lagged by {} events, re-listing",
                        self.collection.name(),
                        skipped
                    );
                    return Some(self.collection.list().await);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Entry>>> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            let snapshot = subscription.next().await?;
            Some((snapshot, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Unsubscribed from {}", self.collection.name());
    }
}
