use collection_loader::CollectionLoader;
use collection_loader::error::{InvalidBatchSize, LoadError};
use shared::error::InitializationError;
use shared::geocoding::GoogleGeocoder;
use shared::open_data::SocrataClient;
use shared::store::PgDocumentStore;
use shared::{initialize_db, load_config};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(InitializationError::from)?;

    let config = load_config().map_err(InitializationError::from)?;
    info!(
        open_data = ?config.open_data,
        loader = ?config.loader,
        "config loaded"
    );

    let db_pool = initialize_db(&config.postgres).await?;
    let http_client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(InitializationError::from)?;

    let source = SocrataClient::new(http_client.clone(), &config.open_data);
    let geocoder = GoogleGeocoder::new(http_client, config.geocoding.api_key);
    let store = PgDocumentStore::new(db_pool);

    let loader = CollectionLoader::new(&source, &geocoder, &store)
        .with_collection(config.loader.collection)
        .with_batch_size(config.loader.batch_size)?
        .with_query_limit(config.open_data.limit);

    let res = loader.reload().await;
    match res {
        Ok(ref summary) => info!(
            collection = loader.collection(),
            deleted = summary.deleted,
            batches = summary.batches,
            writes = summary.writes,
            skipped = summary.skipped,
            "establishments reload was successful"
        ),
        Err(ref e) => error!(error = ?e, "failed to reload establishments"),
    }

    res?;
    Ok(())
}

#[derive(Debug, Error)]
enum AppError {
    #[error("initialization error: {0}")]
    Initialization(#[from] InitializationError),
    #[error("invalid loader configuration: {0}")]
    BatchSize(#[from] InvalidBatchSize),
    #[error("reload error: {0}")]
    Load(#[from] LoadError),
}
