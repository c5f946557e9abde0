//! Edge store selection from configuration

use hexconn_storage::{EdgeStore, InMemoryEdgeStore, Result, StoreError};
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};

/// Open the backend named by `config.backend`
///
/// Backends left out of the build report a `Config` store error.
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn EdgeStore>> {
    let store: Box<dyn EdgeStore> = match config.backend {
        StoreBackend::Memory => Box::new(InMemoryEdgeStore::new()),
        StoreBackend::Sqlite => open_sqlite(config)?,
        StoreBackend::Postgres => open_postgres(config).await?,
    };

    info!(
        backend = store.backend_name(),
        id_kind = store.id_kind().as_str(),
        "edge store ready"
    );
    Ok(store)
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &StoreConfig) -> Result<Box<dyn EdgeStore>> {
    let store = hexconn_storage::SqliteEdgeStore::new(&config.sqlite_path)?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &StoreConfig) -> Result<Box<dyn EdgeStore>> {
    Err(StoreError::config("SQLite support was not compiled in"))
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &StoreConfig) -> Result<Box<dyn EdgeStore>> {
    let store = hexconn_storage::PostgresEdgeStore::connect(&postgres_settings(config)?).await?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_config: &StoreConfig) -> Result<Box<dyn EdgeStore>> {
    Err(StoreError::config("PostgreSQL support was not compiled in"))
}

#[cfg(feature = "postgres")]
fn postgres_settings(config: &StoreConfig) -> Result<hexconn_storage::PostgresSettings> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StoreError::config("No database URL configured"))?;

    let mut settings = hexconn_storage::PostgresSettings::new(url);
    settings.table = config.table.clone();
    settings.max_connections = config.max_connections;
    settings.min_connections = config.min_connections;
    settings.acquire_timeout = config.acquire_timeout();
    Ok(settings)
}
