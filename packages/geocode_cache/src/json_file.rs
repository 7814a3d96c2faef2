//! Geocode cache stored as a flat JSON file.
//!
//! The whole map is loaded at open and rewritten after every insert, via a
//! sibling temp file and a rename so an interrupted run never leaves a
//! truncated cache behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use trip_map_itinerary_models::Coordinates;

use crate::{CacheError, GeocodeStore};

/// A [`GeocodeStore`] persisted as `{ "<place>": { "latitude": .., "longitude": .. } }`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Coordinates>,
}

impl JsonFileStore {
    /// Opens the cache at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let entries = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };

        log::debug!(
            "Opened geocode cache {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl GeocodeStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Coordinates>, CacheError> {
        Ok(self.entries.get(key).copied())
    }

    fn put(&mut self, key: &str, coordinates: Coordinates) -> Result<(), CacheError> {
        if self.entries.get(key) == Some(&coordinates) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), coordinates);
        self.persist()
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entries.len())
    }
}
