//! Refresh steps, from feed text to [`TripView`].
//!
//! Each refresh recomputes the itinerary and KPIs from scratch. Nothing is
//! carried over between refreshes except what the geocode cache persists.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use trip_map_geocoder::PlaceResolver;
use trip_map_itinerary_models::ItineraryRow;
use trip_map_source::csv_rows::parse_rows;
use trip_map_source::feed::load_feed;
use trip_map_source::progress::ProgressCallback;

use crate::normalize::{from_snapshot, normalize};
use crate::snapshot::{read_snapshot, write_snapshot};
use crate::{ItineraryError, TripView};

/// Parses feed text and resolves it into a view.
///
/// # Errors
///
/// Returns [`ItineraryError::Source`] if the feed is malformed or
/// [`ItineraryError::Geocode`] if resolution fails.
pub async fn build_from_csv<R: PlaceResolver + ?Sized>(
    text: &str,
    resolver: &mut R,
    progress: &Arc<dyn ProgressCallback>,
    today: NaiveDate,
) -> Result<TripView, ItineraryError> {
    let rows: Vec<ItineraryRow> = parse_rows(text)?.collect();
    log::info!("Parsed {} itinerary rows", rows.len());

    let itinerary = normalize(rows, resolver, progress, today).await?;
    Ok(TripView::new(itinerary))
}

/// Downloads the feed and resolves it live through `resolver`.
///
/// # Errors
///
/// Returns an error if the download, parsing, or geocoding fails.
pub async fn refresh_live<R: PlaceResolver + ?Sized>(
    client: &reqwest::Client,
    feed_url: &str,
    resolver: &mut R,
    progress: &Arc<dyn ProgressCallback>,
    today: NaiveDate,
) -> Result<TripView, ItineraryError> {
    let text = load_feed(client, feed_url).await?;
    build_from_csv(&text, resolver, progress, today).await
}

/// Loads a batch snapshot. No geocoding happens.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or parsed.
pub fn refresh_from_snapshot(path: &Path, today: NaiveDate) -> Result<TripView, ItineraryError> {
    let entries = read_snapshot(path)?;
    log::info!("Loaded {} stops from snapshot {}", entries.len(), path.display());
    Ok(TripView::new(from_snapshot(entries, today)))
}

/// Batch mode: resolves the feed live and writes the snapshot to `output`.
///
/// # Errors
///
/// Returns an error if the refresh fails or the snapshot cannot be written.
/// No snapshot is written when the refresh fails.
pub async fn precompute<R: PlaceResolver + ?Sized>(
    client: &reqwest::Client,
    feed_url: &str,
    resolver: &mut R,
    output: &Path,
    progress: &Arc<dyn ProgressCallback>,
    today: NaiveDate,
) -> Result<TripView, ItineraryError> {
    let view = refresh_live(client, feed_url, resolver, progress, today).await?;
    write_snapshot(output, &view.itinerary)?;
    Ok(view)
}
