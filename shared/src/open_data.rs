use crate::OpenDataConfig;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

pub const NYC_OPEN_DATA_DOMAIN: &str = "data.cityofnewyork.us";
pub const OUTDOOR_DINING_DATASET: &str = "pitm-atqc";

/// SoQL floating timestamp format, e.g. `2020-06-22T14:03:11.000000`.
pub const SOQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One row of the open data dataset, keyed by its native column names.
///
/// Socrata serializes nearly every column as a JSON string, including numbers and
/// coordinates. Absent columns are omitted from the row rather than sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

pub fn soql_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(SOQL_TIMESTAMP_FORMAT).to_string()
}

/// Filter for alcohol-qualified establishments submitted strictly before `dt`.
pub fn submitted_before(dt: &NaiveDateTime) -> String {
    format!(
        r#"qualify_alcohol="yes" AND time_of_submission<"{}""#,
        soql_timestamp(dt)
    )
}

#[derive(Debug, Error)]
pub enum UpstreamQueryError {
    #[error("open data request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub trait RecordSource {
    fn query(
        &self,
        filter: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RawRecord>, UpstreamQueryError>> + Send;
}

#[derive(Debug, Clone)]
pub struct SocrataClient {
    client: reqwest::Client,
    domain: String,
    dataset: String,
    app_token: Option<String>,
}

impl SocrataClient {
    pub fn new(client: reqwest::Client, config: &OpenDataConfig) -> Self {
        Self {
            client,
            domain: config.domain.clone(),
            dataset: config.dataset.clone(),
            app_token: config.app_token.clone(),
        }
    }

    pub fn resource_url(&self) -> String {
        format!("https://{}/resource/{}.json", self.domain, self.dataset)
    }
}

impl RecordSource for SocrataClient {
    #[instrument(skip(self), fields(dataset = %self.dataset))]
    async fn query(&self, filter: &str, limit: u32) -> Result<Vec<RawRecord>, UpstreamQueryError> {
        debug!("querying open data dataset");
        let mut request = self
            .client
            .get(self.resource_url())
            .query(&[("$where", filter.to_string()), ("$limit", limit.to_string())]);
        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        let records = request
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawRecord>>()
            .await?;
        debug!(len = records.len(), "fetched records from open data");

        Ok(records)
    }
}
