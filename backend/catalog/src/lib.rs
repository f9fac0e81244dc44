//! # Catalog
//!
//! Fixed, ordered list of slices visitors can vote on.
//!
//! - Read-only for the lifetime of the server
//! - Order is the chart order on the results view
//! - Each item is keyed by its display name with spaces swapped for `-`
//!
//! The default catalog is embedded at compile time. A different one can be loaded from a
//! JSON file or fetched from a URL, see [`remote`].
use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod remote;

const DEFAULT_CATALOG: &str = include_str!("../slices.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Duplicate item key: {0}")]
    DuplicateKey(String),

    #[error("Item name is blank at position {0}")]
    BlankName(usize),

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw `{name, description}` pair as supplied by configuration.
#[derive(Deserialize, Debug, Clone)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    positions: HashMap<String, usize>,
}

pub fn item_key(name: &str) -> String {
    name.trim().replace(' ', "-")
}

impl Catalog {
    pub fn from_entries(entries: Vec<Entry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut items = Vec::with_capacity(entries.len());
        let mut positions = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let key = item_key(&entry.name);
            if key.is_empty() {
                return Err(CatalogError::BlankName(index));
            }

            if positions.insert(key.clone(), index).is_some() {
                return Err(CatalogError::DuplicateKey(key));
            }

            items.push(Item {
                key,
                name: entry.name.trim().to_string(),
                description: entry.description,
            });
        }

        Ok(Self { items, positions })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<Entry> = serde_json::from_str(json)?;

        Self::from_entries(entries)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.key.as_str())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}

pub fn get_catalog() -> Result<Catalog, CatalogError> {
    Catalog::from_json(DEFAULT_CATALOG)
}

pub fn get_catalog_file(path: impl AsRef<Path>) -> anyhow::Result<Catalog> {
    let data = fs::read_to_string(path)?;

    Ok(Catalog::from_json(&data)?)
}
