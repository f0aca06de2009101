//! SQLite document store
//!
//! Documents live in a single `documents` table keyed by
//! `(partition_key, id)`, with the record body as JSON text. Tombstones are
//! rows with a non-null `expires_at` (unix milliseconds).

use super::{
    expiry_after, single_partition, BatchOutcome, CreateOutcome, DocumentQuery, DocumentStore,
    StoreResult,
};
use crate::shared::error::StoreError;
use crate::shared::model::Document;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::backend(format!("sqlite: {}", err))
    }
}

const UPSERT_OVER_TOMBSTONE: &str = r#"
    INSERT INTO documents (partition_key, id, body, expires_at)
    VALUES (?1, ?2, ?3, NULL)
    ON CONFLICT (partition_key, id) DO UPDATE
        SET body = excluded.body, expires_at = NULL
        WHERE documents.expires_at IS NOT NULL
"#;

/// sqlx-backed document store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://plans.db`) and run migrations
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `sqlite::memory:` opens a separate database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::info!("[Store] Running document store migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Private in-memory database
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }
}

fn row_to_document(row: &SqliteRow) -> StoreResult<Document> {
    let body: String = row.try_get("body")?;
    Ok(Document {
        partition_key: row.try_get("partition_key")?,
        id: row.try_get("id")?,
        body: serde_json::from_str(&body)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn read(&self, partition_key: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT partition_key, id, body
            FROM documents
            WHERE partition_key = ?1 AND id = ?2 AND expires_at IS NULL
            "#,
        )
        .bind(partition_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn query(&self, partition_key: &str, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT partition_key, id, body
            FROM documents
            WHERE partition_key = ?1
              AND substr(id, 1, length(?2)) = ?2
              AND expires_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(partition_key)
        .bind(query.scan_prefix())
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in &rows {
            let doc = row_to_document(row)?;
            if query.matches(&doc.id) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn create(&self, doc: &Document) -> StoreResult<CreateOutcome> {
        let body = serde_json::to_string(&doc.body)?;
        let result = sqlx::query(UPSERT_OVER_TOMBSTONE)
            .bind(&doc.partition_key)
            .bind(&doc.id)
            .bind(body)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(CreateOutcome::Created);
        }
        match self.read(&doc.partition_key, &doc.id).await? {
            Some(existing) => Ok(CreateOutcome::Exists(existing)),
            None => Err(StoreError::backend(format!(
                "document '{}' changed during create",
                doc.id
            ))),
        }
    }

    async fn create_batch(&self, docs: &[Document]) -> StoreResult<BatchOutcome> {
        let Some(partition_key) = single_partition(docs)? else {
            return Ok(BatchOutcome::Created);
        };

        let mut tx = self.pool.begin().await?;
        for doc in docs {
            let live = sqlx::query(
                r#"
                SELECT 1 FROM documents
                WHERE partition_key = ?1 AND id = ?2 AND expires_at IS NULL
                "#,
            )
            .bind(partition_key)
            .bind(&doc.id)
            .fetch_optional(&mut *tx)
            .await?;
            if live.is_some() {
                tx.rollback().await?;
                return Ok(BatchOutcome::Conflict(doc.id.clone()));
            }
        }
        for doc in docs {
            sqlx::query(UPSERT_OVER_TOMBSTONE)
                .bind(partition_key)
                .bind(&doc.id)
                .bind(serde_json::to_string(&doc.body)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(BatchOutcome::Created)
    }

    async fn replace(&self, doc: &Document) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET body = ?3
            WHERE partition_key = ?1 AND id = ?2 AND expires_at IS NULL
            "#,
        )
        .bind(&doc.partition_key)
        .bind(&doc.id)
        .bind(serde_json::to_string(&doc.body)?)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tombstone(&self, partition_key: &str, id: &str, ttl: Duration) -> StoreResult<bool> {
        let expires_at = expiry_after(ttl)?.timestamp_millis();
        let result = sqlx::query(
            r#"
            UPDATE documents SET expires_at = ?3
            WHERE partition_key = ?1 AND id = ?2 AND expires_at IS NULL
            "#,
        )
        .bind(partition_key)
        .bind(id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = chrono::Utc::now().timestamp_millis();
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE expires_at IS NOT NULL AND expires_at <= ?1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
