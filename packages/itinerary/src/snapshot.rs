//! Batch snapshot of the resolved itinerary.
//!
//! The snapshot is a JSON array of [`SnapshotEntry`] records, one per stop
//! in itinerary order. A consumer that loads it needs no geocoding.

use std::path::Path;

use trip_map_geocode_cache::paths::ensure_dir;
use trip_map_itinerary_models::{NormalizedItinerary, SnapshotEntry};

use crate::ItineraryError;

/// Writes the itinerary to `path` as pretty-printed JSON.
///
/// The file is written to a sibling temporary file first and renamed into
/// place, so readers never see a partial snapshot.
///
/// # Errors
///
/// Returns [`ItineraryError::Io`] if the directory or file cannot be
/// written.
pub fn write_snapshot(path: &Path, itinerary: &NormalizedItinerary) -> Result<(), ItineraryError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let entries: Vec<SnapshotEntry> = itinerary.iter().map(SnapshotEntry::from).collect();
    let json = serde_json::to_string_pretty(&entries)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;

    log::info!("Wrote {} stops to {}", entries.len(), path.display());
    Ok(())
}

/// Reads snapshot records from `path`.
///
/// # Errors
///
/// Returns [`ItineraryError::Io`] if the file cannot be read or
/// [`ItineraryError::Snapshot`] if it is not a valid snapshot.
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotEntry>, ItineraryError> {
    let text = std::fs::read_to_string(path)?;
    let entries: Vec<SnapshotEntry> =
        serde_json::from_str(&text).map_err(|e| ItineraryError::Snapshot {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    log::debug!("Read {} snapshot entries from {}", entries.len(), path.display());
    Ok(entries)
}
