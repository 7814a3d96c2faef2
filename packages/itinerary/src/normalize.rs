//! Turns feed rows into a date-sorted itinerary.

use std::sync::Arc;

use chrono::NaiveDate;
use trip_map_geocoder::PlaceResolver;
use trip_map_itinerary_models::{
    Coordinates, ItineraryRow, NormalizedItinerary, ResolvedStop, SnapshotEntry, TransportMode,
};
use trip_map_source::parsing::parse_stop_date;
use trip_map_source::progress::ProgressCallback;

use crate::ItineraryError;

/// Resolves every row, drops the ones that cannot be placed, and sorts the
/// rest by date.
///
/// Rows are handled strictly in input order with at most one lookup in
/// flight. Rows that already carry coordinates skip the resolver. A row the
/// resolver cannot find is logged and left out; the partial itinerary is
/// still a valid result.
///
/// # Errors
///
/// Returns [`ItineraryError::Geocode`] if the resolver fails (network,
/// provider, or cache error). The whole run is aborted in that case.
pub async fn normalize<R: PlaceResolver + ?Sized>(
    rows: Vec<ItineraryRow>,
    resolver: &mut R,
    progress: &Arc<dyn ProgressCallback>,
    today: NaiveDate,
) -> Result<NormalizedItinerary, ItineraryError> {
    progress.set_total(rows.len() as u64);

    let mut stops = Vec::with_capacity(rows.len());
    let mut skipped = 0_usize;

    for row in rows {
        progress.set_message(row.place.clone());

        let coordinates = match row.coordinates {
            Some(pre_resolved) => Some(pre_resolved),
            None => resolver.resolve(&row.place).await?,
        };
        progress.inc(1);

        let Some(coordinates) = coordinates else {
            log::info!("Skipping '{}': place could not be geocoded", row.place);
            skipped += 1;
            continue;
        };

        stops.push(build_stop(row, coordinates, today));
    }

    let itinerary = finalize(stops);
    log::info!(
        "Normalized itinerary: {} stops, {skipped} skipped",
        itinerary.len()
    );
    progress.finish(format!("{} stops", itinerary.len()));

    Ok(itinerary)
}

/// Rebuilds an itinerary from batch snapshot records without geocoding.
#[must_use]
pub fn from_snapshot(entries: Vec<SnapshotEntry>, today: NaiveDate) -> NormalizedItinerary {
    let stops = entries
        .into_iter()
        .map(|entry| {
            let coordinates = Coordinates::new(entry.lat, entry.lng);
            build_stop(entry.into_row(), coordinates, today)
        })
        .collect();
    finalize(stops)
}

/// Builds a stop from a row and its resolved position.
#[must_use]
pub fn build_stop(row: ItineraryRow, coordinates: Coordinates, today: NaiveDate) -> ResolvedStop {
    let parsed = parse_stop_date(&row.date, today);
    let mode = row.transport.as_deref().and_then(TransportMode::from_cell);

    ResolvedStop {
        place: row.place,
        title: row.title,
        date: row.date,
        description: row.description,
        transport: row.transport,
        coordinates,
        when: parsed.when,
        date_format: parsed.format,
        mode,
        is_current: false,
    }
}

/// Stable-sorts stops by date and flags the last one as current.
#[must_use]
pub fn finalize(mut stops: Vec<ResolvedStop>) -> NormalizedItinerary {
    stops.sort_by_key(|s| s.when);

    let last = stops.len().checked_sub(1);
    for (i, stop) in stops.iter_mut().enumerate() {
        stop.is_current = Some(i) == last;
    }

    NormalizedItinerary { stops }
}
