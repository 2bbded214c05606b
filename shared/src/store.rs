use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Upper bound on writes accepted in a single atomic batch.
pub const MAX_BATCH_WRITES: usize = 500;

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub reference: DocumentRef,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub update_time: DateTime<Utc>,
}

/// Writes staged for one atomic commit. Setting the same reference twice keeps both
/// writes; the later one wins when committed.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<(DocumentRef, Fields)>,
}

impl WriteBatch {
    pub fn set(&mut self, document: DocumentRef, fields: Fields) -> &mut Self {
        self.writes.push((document, fields));
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[(DocumentRef, Fields)] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<(DocumentRef, Fields)> {
        self.writes
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("batch of {0} writes exceeds the limit of {MAX_BATCH_WRITES}")]
    BatchTooLarge(usize),
}

pub trait DocumentStore {
    fn list_documents(
        &self,
        collection: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    fn delete_document(
        &self,
        document: &DocumentRef,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    /// Applies every write in `batch` atomically, returning one result per write.
    fn commit(
        &self,
        batch: WriteBatch,
    ) -> impl Future<Output = Result<Vec<WriteResult>, StoreError>> + Send;
}

/// Document collections persisted as JSONB rows of the `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: Pool<Postgres>,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

impl DocumentStore for PgDocumentStore {
    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(String, Json<Fields>)> = sqlx::query_as(
            r#"
            SELECT id, fields
            FROM documents
            WHERE collection = $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document {
                reference: DocumentRef::new(collection, id),
                fields,
            })
            .collect())
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(&document.collection)
            .bind(&document.id)
            .execute(&self.pool)
            .await?;
        trace!(collection = document.collection, id = document.id, "deleted document");
        Ok(())
    }

    #[instrument(skip_all, fields(writes = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<WriteResult>, StoreError> {
        if batch.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge(batch.len()));
        }
        if batch.is_empty() {
            trace!("empty batch, nothing to write");
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(batch.len());
        for (document, fields) in batch.into_writes() {
            let update_time: DateTime<Utc> = sqlx::query_scalar(
                r#"
                INSERT INTO documents (collection, id, fields, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (collection, id) DO UPDATE
                SET fields = EXCLUDED.fields,
                    updated_at = EXCLUDED.updated_at
                RETURNING updated_at
                "#,
            )
            .bind(&document.collection)
            .bind(&document.id)
            .bind(Json(fields))
            .fetch_one(&mut *tx)
            .await?;
            results.push(WriteResult { update_time });
        }
        tx.commit().await?;

        debug!(writes = results.len(), "committed write batch");
        Ok(results)
    }
}
