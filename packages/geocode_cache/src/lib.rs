#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistent geocoding cache.
//!
//! Maps a normalized place name to the coordinates the geocoder returned
//! for it. Entries never expire and are never evicted. Only successful
//! lookups are stored, so a place that was not found is retried on the
//! next run.
//!
//! Backends implement [`GeocodeStore`]:
//!
//! - [`MemoryStore`]: process-local, for tests and throwaway runs.
//! - [`json_file::JsonFileStore`]: a JSON object on disk, written through
//!   on every insert. The default for interactive runs.
//! - `duckdb_store::DuckDbStore` (feature `duckdb`): an embedded `DuckDB`
//!   table.

#[cfg(feature = "duckdb")]
pub mod duckdb_store;
pub mod json_file;
pub mod paths;

use std::collections::BTreeMap;

use trip_map_itinerary_models::Coordinates;

/// Errors from cache reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid cache JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The embedded database rejected a query.
    #[cfg(feature = "duckdb")]
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),
}

/// A key-value store from place key to coordinates.
///
/// Access is check-then-set from a single worker, so `put` takes `&mut
/// self` and the borrow checker rules out concurrent writers.
pub trait GeocodeStore: Send {
    /// Looks up a cached position.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Coordinates>, CacheError>;

    /// Stores a position, replacing any previous value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend cannot be written.
    fn put(&mut self, key: &str, coordinates: Coordinates) -> Result<(), CacheError>;

    /// Number of cached entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend cannot be read.
    fn len(&self) -> Result<usize, CacheError>;
}

impl<S: GeocodeStore + ?Sized> GeocodeStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Coordinates>, CacheError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, coordinates: Coordinates) -> Result<(), CacheError> {
        (**self).put(key, coordinates)
    }

    fn len(&self) -> Result<usize, CacheError> {
        (**self).len()
    }
}

/// Normalizes a free-text place name into a cache key.
///
/// Only surrounding whitespace is removed; case and inner punctuation are
/// significant.
#[must_use]
pub fn cache_key(place: &str) -> &str {
    place.trim()
}

/// In-memory store. Contents are lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Coordinates>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeocodeStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Coordinates>, CacheError> {
        Ok(self.entries.get(key).copied())
    }

    fn put(&mut self, key: &str, coordinates: Coordinates) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), coordinates);
        Ok(())
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_trims_only() {
        assert_eq!(cache_key("  Paris, France \n"), "Paris, France");
        assert_eq!(cache_key("paris"), "paris");
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("Paris").unwrap(), None);

        store.put("Paris", Coordinates::new(48.8566, 2.3522)).unwrap();
        assert_eq!(
            store.get("Paris").unwrap(),
            Some(Coordinates::new(48.8566, 2.3522))
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn GeocodeStore> = Box::new(MemoryStore::new());
        store.put("Vienna", Coordinates::new(48.2082, 16.3738)).unwrap();
        assert!(store.get("Vienna").unwrap().is_some());
    }
}
