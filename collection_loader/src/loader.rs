use crate::batch::{plan_batches, validate_batch_size};
use crate::builder::build_establishment;
use crate::error::{InvalidBatchSize, LoadError};
use crate::model::ESTABLISHMENTS_COLLECTION;
use chrono::{NaiveDateTime, Utc};
use shared::geocoding::Geocoder;
use shared::open_data::{RecordSource, submitted_before};
use shared::store::{DocumentStore, MAX_BATCH_WRITES};
use tracing::{debug, info, warn};

pub const DEFAULT_QUERY_LIMIT: u32 = 50_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub batches: usize,
    pub writes: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadSummary {
    pub deleted: usize,
    pub batches: usize,
    pub writes: usize,
    pub skipped: usize,
}

/// Rebuilds an establishments collection from the open data source.
pub struct CollectionLoader<'a, Q, G, S> {
    source: &'a Q,
    geocoder: &'a G,
    store: &'a S,
    collection: String,
    batch_size: usize,
    query_limit: u32,
}

impl<'a, Q, G, S> CollectionLoader<'a, Q, G, S>
where
    Q: RecordSource,
    G: Geocoder,
    S: DocumentStore,
{
    pub fn new(source: &'a Q, geocoder: &'a G, store: &'a S) -> Self {
        Self {
            source,
            geocoder,
            store,
            collection: ESTABLISHMENTS_COLLECTION.to_string(),
            batch_size: MAX_BATCH_WRITES,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Page size for deletion and write batches alike.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, InvalidBatchSize> {
        self.batch_size = validate_batch_size(batch_size)?;
        Ok(self)
    }

    pub fn with_query_limit(mut self, query_limit: u32) -> Self {
        self.query_limit = query_limit;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Deletes the collection, then rebuilds it from records submitted before now.
    ///
    /// Deletion always runs to completion before the first write.
    pub async fn reload(&self) -> Result<ReloadSummary, LoadError> {
        let deleted = self.delete_collection().await?;
        let built = self.build_collection().await?;

        Ok(ReloadSummary {
            deleted,
            batches: built.batches,
            writes: built.writes,
            skipped: built.skipped,
        })
    }

    /// Deletes every document in the collection one page at a time, returning how many
    /// were removed. Stops after the first page shorter than the batch size.
    pub async fn delete_collection(&self) -> Result<usize, LoadError> {
        let mut deleted = 0;
        loop {
            let documents = self
                .store
                .list_documents(&self.collection, self.batch_size)
                .await
                .map_err(|source| LoadError::Delete { deleted, source })?;
            let fetched = documents.len();

            for document in documents {
                self.store
                    .delete_document(&document.reference)
                    .await
                    .map_err(|source| LoadError::Delete { deleted, source })?;
                deleted += 1;
            }
            debug!(fetched, deleted, "deleted page of documents");

            if fetched < self.batch_size {
                break;
            }
        }

        info!(collection = self.collection, deleted, "deleted collection");
        Ok(deleted)
    }

    pub async fn build_collection(&self) -> Result<BuildSummary, LoadError> {
        self.build_collection_before(Utc::now().naive_utc()).await
    }

    /// Loads every record submitted before `cutoff` into the collection, one atomic
    /// batch at a time in ascending order. Malformed records are skipped.
    ///
    /// A failed commit ends the load; batches committed before it stay written.
    pub async fn build_collection_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<BuildSummary, LoadError> {
        let filter = submitted_before(&cutoff);
        let records = self.source.query(&filter, self.query_limit).await?;
        info!(count = records.len(), "fetched open data records");

        let mut establishments = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for raw in &records {
            match build_establishment(raw, self.geocoder).await {
                Ok(establishment) => establishments.push(establishment),
                Err(e) => {
                    warn!(
                        error = %e,
                        globalid = ?raw.get("globalid"),
                        "skipping malformed record"
                    );
                    skipped += 1;
                }
            }
        }

        let mut summary = BuildSummary {
            skipped,
            ..BuildSummary::default()
        };
        for range in plan_batches(establishments.len(), self.batch_size)? {
            let mut batch = self.store.batch();
            for establishment in &establishments[range] {
                let fields = establishment
                    .to_fields()
                    .map_err(|source| LoadError::Serialize {
                        id: establishment.id.clone(),
                        source,
                    })?;
                batch.set(establishment.document_ref(&self.collection), fields);
            }

            let results = self
                .store
                .commit(batch)
                .await
                .map_err(|source| LoadError::Commit {
                    batches: summary.batches,
                    writes: summary.writes,
                    source,
                })?;
            summary.batches += 1;
            summary.writes += results.len();
            debug!(
                batch = summary.batches,
                writes = results.len(),
                "committed batch"
            );
        }

        info!(
            collection = self.collection,
            batches = summary.batches,
            writes = summary.writes,
            skipped = summary.skipped,
            "loaded collection"
        );
        Ok(summary)
    }
}
