use super::{BatchWrite, ChangeEvent, Document, DocumentStore, CHANGE_FEED_CAPACITY};
use crate::error::StoreError;
use crate::models::CollectionKind;
use crate::settings::SETTINGS_COLLECTION;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Postgres NOTIFY channel carrying the name of the changed collection.
pub const CHANGE_CHANNEL: &str = "document_changes";

type DocumentRow = (String, Json<Map<String, Value>>);

/// PostgreSQL-backed document store.
///
/// Documents live in a single JSONB table keyed by `(collection, id)`. A row
/// trigger calls `pg_notify` on every change, so edits made by other processes
/// reach subscribers too.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl PgStore {
    /// Connect, create the schema if needed, and start forwarding change
    /// notifications into the broadcast channel.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::migrate(&pool).await?;

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tokio::spawn(forward_changes(listener, changes.clone()));

        info!("✓ Connected to PostgreSQL document store");

        Ok(Self { pool, changes })
    }

    async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL DEFAULT '{}'::jsonb,
                seq BIGSERIAL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE OR REPLACE FUNCTION notify_document_change() RETURNS trigger AS $$
            BEGIN
                PERFORM pg_notify('document_changes', COALESCE(NEW.collection, OLD.collection));
                RETURN NULL;
            END;
            $$ LANGUAGE plpgsql",
        )
        .execute(pool)
        .await?;

        sqlx::query("DROP TRIGGER IF EXISTS documents_notify ON documents")
            .execute(pool)
            .await?;

        sqlx::query(
            "CREATE TRIGGER documents_notify
             AFTER INSERT OR UPDATE OR DELETE ON documents
             FOR EACH ROW EXECUTE FUNCTION notify_document_change()",
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

async fn forward_changes(mut listener: PgListener, changes: broadcast::Sender<ChangeEvent>) {
    loop {
        match listener.try_recv().await {
            Ok(Some(notification)) => {
                let _ = changes.send(ChangeEvent {
                    collection: notification.payload().to_string(),
                });
            }
            Ok(None) => {
                // try_recv reconnects on the next call; notifications sent in
                // the gap are gone
                warn!("Change feed connection lost, refreshing all live views");
                resync_all(&changes);
            }
            Err(e) => {
                warn!("Change feed interrupted: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                resync_all(&changes);
            }
        }
    }
}

/// Tell every subscriber to re-list, whatever collection it watches.
fn resync_all(changes: &broadcast::Sender<ChangeEvent>) {
    let collections = CollectionKind::ALL
        .into_iter()
        .map(|kind| kind.name())
        .chain([SETTINGS_COLLECTION]);

    for collection in collections {
        let _ = changes.send(ChangeEvent {
            collection: collection.to_string(),
        });
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, Json(data))| Document { id, data }))
    }

    async fn insert(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(&data))
            .execute(&self.pool)
            .await?;

        Ok(Document { id, data })
    }

    async fn overwrite(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE documents SET data = $3 WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .bind(Json(&data))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET data = documents.data || EXCLUDED.data",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<usize, StoreError> {
        let count = writes.len();
        let mut tx = self.pool.begin().await?;

        for write in writes {
            let result = sqlx::query(
                "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
                 ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
            )
            .bind(&write.collection)
            .bind(&write.document.id)
            .bind(Json(&write.document.data))
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                error!(
                    "Batch write failed at {}/{}, rolling back",
                    write.collection, write.document.id
                );
                tx.rollback().await?;
                return Err(e.into());
            }
        }

        tx.commit().await?;
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
