use std::sync::Arc;

use anyhow::Context;
use sqlx::MySqlPool;

use crate::config::{Config, DataStoreKind};
use crate::store::{MemoryStore, MySqlStore, Store};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

/// Opens the store selected by `DATA_STORE`.
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.data_store {
        DataStoreKind::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when DATA_STORE=mysql")?;
            let pool = init_db(url)
                .await
                .context("Failed to connect to database")?;
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        DataStoreKind::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
