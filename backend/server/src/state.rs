use std::sync::Arc;

use anyhow::Result;
use axum_extra::extract::cookie::Key;
use catalog::{Catalog, remote::load_catalog};
use tracing::info;

use super::{config::Config, database::RedisStore, memory::MemoryStore, store::SharedStore};

pub struct State {
    pub catalog: Catalog,
    pub config: Config,
    pub store: SharedStore,
    /// Signs session cookies. Generated per process, so restarts invalidate old cookies.
    pub key: Key,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let catalog = load_catalog(config.catalog_source.as_deref()).await?;
        info!("Loaded {} items", catalog.items().len());

        let store = match &config.redis_url {
            Some(redis_url) => {
                info!("Using Redis store at {redis_url}");
                SharedStore::new(RedisStore::connect(redis_url).await?)
            }
            None => {
                info!("Using in-memory store");
                SharedStore::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(catalog, config, store))
    }

    pub fn with_store(catalog: Catalog, config: Config, store: SharedStore) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            config,
            store,
            key: Key::generate(),
        })
    }
}
