//! Transformation catalog
//!
//! The catalog maps `(transformation, site)` to one or more physical
//! entries. Storage backends live elsewhere; [`InMemoryCatalog`] is the
//! backend used by the planner binary and by tests.

use crate::error::CatalogError;
use dashmap::DashMap;
use std::fmt;
use xfer_model::{TransformationCatalogEntry, TransformationName, TransformationType};

/// Lookup and insert of transformation catalog entries
pub trait TransformationCatalog: Send + Sync + fmt::Debug {
    /// All entries for `name` on `site`, optionally filtered by type.
    ///
    /// Returns an empty list when nothing matches.
    ///
    /// # Errors
    /// Returns error if the backend cannot be queried
    fn lookup(
        &self,
        name: &TransformationName,
        site: &str,
        kind: Option<TransformationType>,
    ) -> Result<Vec<TransformationCatalogEntry>, CatalogError>;

    /// Insert an entry, returning how many entries were added.
    ///
    /// Inserting an entry that is already present adds nothing and
    /// returns 0. `commit` asks durable backends to persist immediately.
    ///
    /// # Errors
    /// Returns error if the backend rejects the write
    fn insert(&self, entry: TransformationCatalogEntry, commit: bool)
        -> Result<usize, CatalogError>;
}

type Key = (TransformationName, String);

/// Catalog held in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: DashMap<Key, Vec<TransformationCatalogEntry>>,
    read_only: bool,
}

impl InMemoryCatalog {
    /// Create an empty writable catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog that rejects inserts
    #[must_use]
    pub fn read_only(entries: impl IntoIterator<Item = TransformationCatalogEntry>) -> Self {
        let catalog = Self::from_entries(entries);
        Self {
            entries: catalog.entries,
            read_only: true,
        }
    }

    /// Create a writable catalog pre-populated with `entries`
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = TransformationCatalogEntry>) -> Self {
        let catalog = Self::new();
        for entry in entries {
            catalog.add(entry);
        }
        catalog
    }

    /// Number of entries across all keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    /// Whether the catalog holds no entry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add(&self, entry: TransformationCatalogEntry) -> usize {
        let key = (entry.name.clone(), entry.site.clone());
        let mut slot = self.entries.entry(key).or_default();
        if slot.contains(&entry) {
            0
        } else {
            slot.push(entry);
            1
        }
    }
}

impl TransformationCatalog for InMemoryCatalog {
    fn lookup(
        &self,
        name: &TransformationName,
        site: &str,
        kind: Option<TransformationType>,
    ) -> Result<Vec<TransformationCatalogEntry>, CatalogError> {
        let key = (name.clone(), site.to_string());
        Ok(self
            .entries
            .get(&key)
            .map(|slot| {
                slot.iter()
                    .filter(|e| kind.map_or(true, |k| e.kind == k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(
        &self,
        entry: TransformationCatalogEntry,
        _commit: bool,
    ) -> Result<usize, CatalogError> {
        if self.read_only {
            return Err(CatalogError::ReadOnly {
                transformation: entry.name.to_string(),
                site: entry.site,
            });
        }
        Ok(self.add(entry))
    }
}
