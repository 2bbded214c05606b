#![allow(dead_code)]

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};
use shared::geocoding::{Coordinates, GeocodeError, Geocoder};
use shared::open_data::{RawRecord, RecordSource, UpstreamQueryError};
use shared::store::{
    Document, DocumentRef, DocumentStore, Fields, MAX_BATCH_WRITES, StoreError, WriteBatch,
    WriteResult,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn raw(value: Value) -> RawRecord {
    serde_json::from_value(value).unwrap()
}

/// A record that normalizes cleanly, with upstream coordinates and no seating.
pub fn record(n: usize) -> RawRecord {
    raw(json!({
        "globalid": format!("{{00000000-0000-0000-0000-{n:012}}}"),
        "doing_business_as_dba": format!("Establishment {n}"),
        "business_address": format!("{n} Broadway"),
        "zip": "10001",
        "sla_license_type": "OP",
        "time_of_submission": "2020-07-01T12:00:00.000000",
        "qualify_alcohol": "yes",
        "approved_for_sidewalk_seating": "no",
        "approved_for_roadway_seating": "no",
        "seating_interest_sidewalk": "sidewalk",
        "latitude": "40.75",
        "longitude": "-73.99"
    }))
}

pub struct ScriptedSource {
    records: Vec<RawRecord>,
    fail: bool,
    pub queries: Mutex<Vec<(String, u32)>>,
}

impl ScriptedSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

impl RecordSource for ScriptedSource {
    async fn query(
        &self,
        filter: &str,
        limit: u32,
    ) -> Result<Vec<RawRecord>, UpstreamQueryError> {
        self.queries.lock().push((filter.to_string(), limit));
        if self.fail {
            // An unparseable URL is the simplest way to get a real reqwest::Error
            let err = reqwest::Client::new()
                .get("not a url")
                .build()
                .unwrap_err();
            return Err(err.into());
        }
        Ok(self.records.iter().take(limit as usize).cloned().collect())
    }
}

pub struct RecordingGeocoder {
    result: Option<Coordinates>,
    calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl RecordingGeocoder {
    pub fn returning(lat: f64, lng: f64) -> Self {
        Self {
            result: Some(Coordinates { lat, lng }),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for RecordingGeocoder {
    async fn geocode(&self, address_query: &str) -> Result<Coordinates, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(address_query.to_string());
        self.result.ok_or(GeocodeError::NoResults)
    }
}

/// Document store keeping collections in memory and recording every call.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<(String, String), Fields>>,
    pub list_sizes: Mutex<Vec<usize>>,
    pub commit_sizes: Mutex<Vec<usize>>,
    fail_commit_at: Option<usize>,
}

impl MemoryStore {
    /// Fails the commit that would follow `successful` successful commits.
    pub fn failing_commit_after(successful: usize) -> Self {
        Self {
            fail_commit_at: Some(successful),
            ..Self::default()
        }
    }

    pub fn with_documents(collection: &str, count: usize) -> Self {
        let store = Self::default();
        {
            let mut documents = store.documents.lock();
            for n in 0..count {
                let mut fields = Fields::new();
                fields.insert("name".to_string(), json!(format!("stale {n}")));
                documents.insert((collection.to_string(), format!("stale-{n:05}")), fields);
            }
        }
        store
    }

    pub fn count(&self, collection: &str) -> usize {
        self.documents
            .lock()
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Fields> {
        self.documents
            .lock()
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }
}

impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let documents: Vec<Document> = self
            .documents
            .lock()
            .iter()
            .filter(|((c, _), _)| c == collection)
            .take(limit)
            .map(|((c, id), fields)| Document {
                reference: DocumentRef::new(c.clone(), id.clone()),
                fields: fields.clone(),
            })
            .collect();
        self.list_sizes.lock().push(documents.len());
        Ok(documents)
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<(), StoreError> {
        self.documents
            .lock()
            .remove(&(document.collection.clone(), document.id.clone()));
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<WriteResult>, StoreError> {
        if batch.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge(batch.len()));
        }
        let attempt = self.commit_sizes.lock().len();
        if self.fail_commit_at == Some(attempt) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }

        self.commit_sizes.lock().push(batch.len());
        let update_time = Utc::now();
        let mut documents = self.documents.lock();
        Ok(batch
            .into_writes()
            .into_iter()
            .map(|(document, fields)| {
                documents.insert((document.collection, document.id), fields);
                WriteResult { update_time }
            })
            .collect())
    }
}
