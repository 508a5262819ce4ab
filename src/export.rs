//! JSON export of a collection and bulk import of previously exported data.

use crate::collection::Entry;
use crate::db::{BatchWrite, DocumentStore};
use crate::error::{CmsError, Result, StoreError};
use crate::models::CollectionKind;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A serialized collection ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub body: String,
}

/// Pretty-print `entries` in the order given.
pub fn export_entries(collection: &str, entries: &[Entry]) -> Result<ExportFile> {
    let body = serde_json::to_string_pretty(entries).map_err(StoreError::from)?;
    Ok(ExportFile {
        filename: format!("{}.json", collection),
        body,
    })
}

/// Parse an export file back into entries.
pub fn parse_export(body: &str) -> Result<Vec<Entry>> {
    serde_json::from_str(body).map_err(|e| CmsError::Validation(format!("invalid export: {}", e)))
}

/// Contents for every collection, as produced by the per-collection exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBundle {
    pub projects: Vec<Entry>,
    pub blogs: Vec<Entry>,
    pub certificates: Vec<Entry>,
}

impl ImportBundle {
    pub fn entries(&self, kind: CollectionKind) -> &[Entry] {
        match kind {
            CollectionKind::Projects => &self.projects,
            CollectionKind::Blogs => &self.blogs,
            CollectionKind::Certificates => &self.certificates,
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len() + self.blogs.len() + self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape-check `entries` and turn them into id-preserving batch upserts.
pub(crate) fn batch_writes(kind: CollectionKind, entries: &[Entry]) -> Result<Vec<BatchWrite>> {
    entries
        .iter()
        .map(|entry| {
            if entry.id.trim().is_empty() {
                return Err(CmsError::Validation(format!(
                    "{} entry without an id cannot be imported",
                    kind
                )));
            }
            kind.validate(&entry.fields)?;
            Ok(BatchWrite {
                collection: kind.name().to_string(),
                document: entry.clone().into_document(),
            })
        })
        .collect()
}

/// Upsert every entry of the bundle, ids preserved, in one store batch.
///
/// Entries are shape-checked first; one bad entry aborts the whole import
/// before anything is written.
pub async fn import_bundle(store: &dyn DocumentStore, bundle: ImportBundle) -> Result<usize> {
    let mut writes = Vec::with_capacity(bundle.len());
    for kind in CollectionKind::ALL {
        writes.extend(batch_writes(kind, bundle.entries(kind))?);
    }

    let count = store.write_batch(writes).await?;
    info!(
        "Imported {} entries ({} projects, {} blogs, {} certificates)",
        count,
        bundle.projects.len(),
        bundle.blogs.len(),
        bundle.certificates.len()
    );
    Ok(count)
}
