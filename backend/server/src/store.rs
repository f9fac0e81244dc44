//! # Shared Store
//!
//! Process-wide key/value cache holding every session's counters.
//!
//! ## Keys
//! - `sessions`: set of every session id that has written a snapshot (the registry)
//! - `session:<id>`: JSON encoded [`CounterSnapshot`] for that session
//!
//! ## Guarantees
//! - Last writer wins per key, no locking across keys
//! - Registry insert is an idempotent set insert, safe to race
//! - Nothing is guaranteed to survive a restart
//!
//! Two backends implement [`Store`]: [`MemoryStore`](crate::memory::MemoryStore) for a single
//! process and [`RedisStore`](crate::database::RedisStore).
use std::sync::Arc;

use async_trait::async_trait;
use redis::RedisError;
use thiserror::Error;
use tracing::info;

use crate::models::{CounterSnapshot, SessionId};

pub const REGISTRY_KEY: &str = "sessions";
const SNAPSHOT_PREFIX: &str = "session:";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis: {0}")]
    Redis(#[from] RedisError),

    #[error("Codec: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Key {0} holds the wrong kind of value")]
    WrongType(String),

    #[error("Registry holds a malformed session id: {0}")]
    CorruptSessionId(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Adds `member` to the set under `key`. Returns true if it was not already there.
    async fn insert_member(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Members of the set under `key`, empty if the key is absent.
    async fn members(&self, key: &str) -> Result<Vec<String>, StoreError>;
}

pub fn snapshot_key(session: &SessionId) -> String {
    format!("{SNAPSHOT_PREFIX}{session}")
}

/// Typed view over a [`Store`].
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<dyn Store>,
}

impl SharedStore {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    pub async fn snapshot(&self, session: &SessionId) -> Result<Option<CounterSnapshot>, StoreError> {
        match self.inner.get(&snapshot_key(session)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn put_snapshot(&self, snapshot: &CounterSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;

        self.inner.set(&snapshot_key(&snapshot.session), json).await
    }

    pub async fn register_session(&self, session: &SessionId) -> Result<bool, StoreError> {
        let added = self
            .inner
            .insert_member(REGISTRY_KEY, &session.to_string())
            .await?;

        if added {
            info!("New session registered: {session}");
        }

        Ok(added)
    }

    pub async fn sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        self.inner
            .members(REGISTRY_KEY)
            .await?
            .into_iter()
            .map(|member| {
                member
                    .parse()
                    .map_err(|_| StoreError::CorruptSessionId(member))
            })
            .collect()
    }
}
