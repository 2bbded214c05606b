pub mod geocoding;
pub mod open_data;
pub mod store;

use crate::error::{ConfigError, InitializationError};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, instrument};

pub const ENV_VAR_PREFIX: &str = "OUTDOOR_DINING__";
pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub open_data: OpenDataConfig,
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

#[derive(Deserialize, Clone)]
pub struct OpenDataConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    pub app_token: Option<String>,
    #[serde(default = "default_query_limit")]
    pub limit: u32,
}

impl Default for OpenDataConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            dataset: default_dataset(),
            app_token: None,
            limit: default_query_limit(),
        }
    }
}

impl std::fmt::Debug for OpenDataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenDataConfig")
            .field("domain", &self.domain)
            .field("dataset", &self.dataset)
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .field("limit", &self.limit)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct GeocodingConfig {
    pub api_key: String,
}

// Keep the key out of `info!(config = ?config)` output.
impl std::fmt::Debug for GeocodingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_domain() -> String {
    open_data::NYC_OPEN_DATA_DOMAIN.to_string()
}

fn default_dataset() -> String {
    open_data::OUTDOOR_DINING_DATASET.to_string()
}

fn default_query_limit() -> u32 {
    50_000
}

fn default_collection() -> String {
    "establishments".to_string()
}

fn default_batch_size() -> usize {
    store::MAX_BATCH_WRITES
}

pub fn load_config() -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Toml::file(SETTINGS_FILE))
        .merge(Env::prefixed(ENV_VAR_PREFIX).split("__"))
        .extract::<Config>()?)
}

pub mod error {
    use thiserror::Error;
    use tracing::dispatcher::SetGlobalDefaultError;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("failed to load configuration: {0}")]
        Figment(#[from] figment::Error),
    }

    #[derive(Debug, Error)]
    pub enum InitializationError {
        #[error(transparent)]
        Tracing(#[from] SetGlobalDefaultError),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error(transparent)]
        Migration(#[from] sqlx::migrate::MigrateError),
        #[error(transparent)]
        Db(#[from] sqlx::Error),
        #[error(transparent)]
        HttpClient(#[from] reqwest::Error),
    }
}

#[instrument(skip(pg_config))]
pub async fn initialize_db(
    pg_config: &PostgresConfig,
) -> Result<Pool<Postgres>, InitializationError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&pg_config.connection_string)
        .await?;

    info!("db pool created and connected");

    // Run any new migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
