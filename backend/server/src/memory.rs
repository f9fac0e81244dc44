use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{Store, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Set(BTreeSet<String>),
}

/// In-process store. Values live until the process exits.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entries.get(key).as_deref() {
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(Value::Set(_)) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), Value::Text(value));

        Ok(())
    }

    async fn insert_member(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));

        match entry.value_mut() {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            Value::Text(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries.get(key).as_deref() {
            Some(Value::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Value::Text(_)) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }
}
