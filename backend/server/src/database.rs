//! # Redis
//!
//! RAM database, optional backend for the shared store.
//!
//! Lets several server processes share one set of counters. Persistence across restarts
//! is whatever the Redis deployment provides, nothing here relies on it.
//!
//! ## Implementation
//!
//! - Snapshots: plain string keys holding JSON, `GET`/`SET`
//! - Registry: Redis set, `SADD`/`SMEMBERS`, atomic on the Redis side
//! - One [`ConnectionManager`] cloned per call, it multiplexes over a single connection
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::store::{Store, StoreError};

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            connection: init_redis(redis_url).await?,
        })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.get(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let () = connection.set(key, value).await?;

        Ok(())
    }

    async fn insert_member(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let added: usize = connection.sadd(key, member).await?;

        Ok(added > 0)
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection.smembers(key).await?)
    }
}
