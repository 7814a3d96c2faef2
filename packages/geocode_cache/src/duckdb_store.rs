//! Geocode cache stored in `DuckDB`.
//!
//! Useful when several itineraries share one cache file. Only hits are
//! stored; there is no negative caching.

use std::path::Path;

use duckdb::{Connection, OptionalExt as _};
use trip_map_itinerary_models::Coordinates;

use crate::{CacheError, GeocodeStore};

/// A [`GeocodeStore`] backed by the `geocode_cache` table.
pub struct DuckDbStore {
    conn: Connection,
}

impl DuckDbStore {
    /// Opens (or creates) the cache database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn create_schema(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS geocode_cache (
            place_key TEXT PRIMARY KEY,
            lat DOUBLE NOT NULL,
            lng DOUBLE NOT NULL,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        );",
    )?;
    Ok(())
}

impl GeocodeStore for DuckDbStore {
    fn get(&self, key: &str) -> Result<Option<Coordinates>, CacheError> {
        let mut stmt = self
            .conn
            .prepare("SELECT lat, lng FROM geocode_cache WHERE place_key = ?")?;
        let hit = stmt
            .query_row([key], |row| {
                Ok(Coordinates::new(row.get::<_, f64>(0)?, row.get::<_, f64>(1)?))
            })
            .optional()?;
        Ok(hit)
    }

    fn put(&mut self, key: &str, coordinates: Coordinates) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT INTO geocode_cache (place_key, lat, lng) VALUES (?, ?, ?)
             ON CONFLICT (place_key) DO UPDATE SET lat = excluded.lat, lng = excluded.lng",
            duckdb::params![key, coordinates.latitude, coordinates.longitude],
        )?;
        Ok(())
    }

    fn len(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM geocode_cache", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
