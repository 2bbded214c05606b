use shared::open_data::UpstreamQueryError;
use shared::store::{MAX_BATCH_WRITES, StoreError};
use thiserror::Error;

/// A raw record that cannot become an establishment. Scoped to that one record.
#[derive(Debug, Error)]
pub enum MalformedRecordError {
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("required field {0} is empty")]
    EmptyField(&'static str),
    #[error("field {field} should be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field {field} is not a non-negative integer: {value}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("field {field} is not a finite number: {value}")]
    InvalidFloat { field: &'static str, value: String },
    #[error("invalid submission timestamp {value}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::format::ParseError,
    },
}

#[derive(Debug, Error)]
#[error("batch size must be between 1 and {MAX_BATCH_WRITES}, got {0}")]
pub struct InvalidBatchSize(pub usize);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    BatchSize(#[from] InvalidBatchSize),
    #[error("failed to delete collection after removing {deleted} documents: {source}")]
    Delete { deleted: usize, source: StoreError },
    #[error("open data query failed: {0}")]
    Query(#[from] UpstreamQueryError),
    #[error("failed to serialize establishment {id}: {source}")]
    Serialize {
        id: String,
        source: serde_json::Error,
    },
    #[error("failed to commit batch after {batches} batches and {writes} writes: {source}")]
    Commit {
        batches: usize,
        writes: usize,
        source: StoreError,
    },
}
