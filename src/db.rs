use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use tracing::{info, warn};

use crate::{
    config::{Config, StoreBackend},
    store::{StoreHandle, Stores, memory::MemoryStore, mysql::MySqlStore},
};

/// Connects the document store once at startup. Any failure leaves the
/// portal running with the store marked unavailable.
pub async fn init_store(config: &Config) -> StoreHandle {
    match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            StoreHandle::available(Stores::from_backend(Arc::new(MemoryStore::new())))
        }
        StoreBackend::MySql => match connect_mysql(config).await {
            Ok(store) => {
                info!("Document store connected");
                StoreHandle::available(Stores::from_backend(Arc::new(store)))
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Document store unavailable, continuing without it");
                StoreHandle::unavailable()
            }
        },
    }
}

async fn connect_mysql(config: &Config) -> Result<MySqlStore> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;

    let ssl_mode = if config.db_require_tls {
        MySqlSslMode::Required
    } else {
        MySqlSslMode::Preferred
    };
    let options = MySqlConnectOptions::from_str(url)
        .context("invalid DATABASE_URL")?
        .ssl_mode(ssl_mode);

    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_timeout)
        .connect_with(options)
        .await
        .context("failed to connect to document store")?;

    let store = MySqlStore::new(pool);
    store.ping().await.context("document store ping failed")?;
    store
        .ensure_schema()
        .await
        .context("failed to prepare collections")?;

    Ok(store)
}
