#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Itinerary row, stop, and trip KPI types.
//!
//! These types flow through the whole pipeline: the CSV parser produces
//! [`ItineraryRow`]s, the normalizer turns them into a date-sorted
//! [`NormalizedItinerary`] of [`ResolvedStop`]s, and the aggregator
//! summarizes that into [`TripKpis`]. [`SnapshotEntry`] is the on-disk
//! record written by the batch precompute step.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One data row of the itinerary feed, before geocoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRow {
    /// Free-text place name (e.g. "Paris, France"). Never empty.
    pub place: String,
    /// Short title of the stop.
    pub title: String,
    /// Raw date cell, ISO or day-first.
    pub date: String,
    /// Longer description of the stop.
    pub description: String,
    /// Raw transport cell, `None` when the column is absent or empty.
    pub transport: Option<String>,
    /// Pre-resolved coordinates from `lat`/`lng` columns, if present.
    pub coordinates: Option<Coordinates>,
}

/// How a stop's raw date cell was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateFormat {
    /// `YYYY-MM-DD`, optionally followed by a time.
    Iso,
    /// `DD/MM/YYYY`.
    DayFirst,
    /// Unrecognized; the run date was substituted.
    Fallback,
}

/// Transport mode used to reach a stop.
///
/// Parsed case-insensitively from the feed's `transport` column. Values
/// that match none of the known spellings are kept verbatim in
/// [`TransportMode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum TransportMode {
    #[strum(serialize = "plane", serialize = "avion", serialize = "flight", serialize = "vol")]
    Plane,
    #[strum(serialize = "train", serialize = "rail")]
    Train,
    #[strum(serialize = "bus", serialize = "coach", serialize = "autocar")]
    Bus,
    #[strum(serialize = "car", serialize = "voiture", serialize = "auto", serialize = "drive")]
    Car,
    #[strum(serialize = "bateau", serialize = "boat", serialize = "ferry")]
    Boat,
    #[strum(serialize = "vélo", serialize = "velo", serialize = "bike", serialize = "bicycle")]
    Bike,
    #[strum(
        serialize = "à pied",
        serialize = "a pied",
        serialize = "walk",
        serialize = "foot",
        serialize = "hike"
    )]
    Walk,
    #[strum(default)]
    Other(String),
}

impl TransportMode {
    /// Parses a raw transport cell. Returns `None` for blank input.
    #[must_use]
    pub fn from_cell(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        // `Other` is the strum default, so parsing never fails.
        Some(
            trimmed
                .parse()
                .unwrap_or_else(|_| Self::Other(trimmed.to_string())),
        )
    }
}

/// An itinerary entry with a resolved position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStop {
    pub place: String,
    pub title: String,
    /// Raw date cell as it appeared in the feed.
    pub date: String,
    pub description: String,
    /// Raw transport cell.
    pub transport: Option<String>,
    pub coordinates: Coordinates,
    /// Parsed date used for ordering and KPIs.
    pub when: NaiveDateTime,
    pub date_format: DateFormat,
    /// Transport mode derived from [`Self::transport`].
    pub mode: Option<TransportMode>,
    /// Whether this stop is the traveller's current position.
    pub is_current: bool,
}

impl ResolvedStop {
    /// The trailing comma segment of the place name, trimmed.
    ///
    /// "Vienna, Austria" yields "Austria"; a place without a comma yields
    /// the whole name.
    #[must_use]
    pub fn country(&self) -> &str {
        self.place
            .rsplit(',')
            .next()
            .map_or("", str::trim)
    }
}

/// Resolved stops sorted ascending by date, last one flagged current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedItinerary {
    pub stops: Vec<ResolvedStop>,
}

impl NormalizedItinerary {
    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// The stop flagged as the current position, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ResolvedStop> {
        self.stops.iter().rev().find(|s| s.is_current)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedStop> {
        self.stops.iter()
    }

    /// Stop positions in itinerary order, suitable for drawing the path.
    #[must_use]
    pub fn path(&self) -> Vec<Coordinates> {
        self.stops.iter().map(|s| s.coordinates).collect()
    }
}

impl<'a> IntoIterator for &'a NormalizedItinerary {
    type Item = &'a ResolvedStop;
    type IntoIter = std::slice::Iter<'a, ResolvedStop>;

    fn into_iter(self) -> Self::IntoIter {
        self.stops.iter()
    }
}

/// Trip-level summary statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripKpis {
    /// Great-circle distance along the path, in kilometres.
    pub total_distance_km: f64,
    /// Number of distinct country identifiers.
    pub country_count: usize,
    /// Whole days between the first and last stop, rounded up.
    pub days_elapsed: i64,
}

/// A record of the batch snapshot file.
///
/// Field names match the published spreadsheet columns so the file can be
/// consumed without the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub lieu: String,
    pub titre: String,
    pub date: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl From<&ResolvedStop> for SnapshotEntry {
    fn from(stop: &ResolvedStop) -> Self {
        Self {
            lieu: stop.place.clone(),
            titre: stop.title.clone(),
            date: stop.date.clone(),
            description: stop.description.clone(),
            transport: stop.transport.clone(),
            lat: stop.coordinates.latitude,
            lng: stop.coordinates.longitude,
        }
    }
}

impl SnapshotEntry {
    /// Converts back into a feed row carrying pre-resolved coordinates.
    #[must_use]
    pub fn into_row(self) -> ItineraryRow {
        ItineraryRow {
            place: self.lieu,
            title: self.titre,
            date: self.date,
            description: self.description,
            transport: self.transport,
            coordinates: Some(Coordinates::new(self.lat, self.lng)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_transport_modes() {
        assert_eq!(TransportMode::from_cell("Avion"), Some(TransportMode::Plane));
        assert_eq!(TransportMode::from_cell(" TRAIN "), Some(TransportMode::Train));
        assert_eq!(TransportMode::from_cell("à pied"), Some(TransportMode::Walk));
    }

    #[test]
    fn car_is_a_car_and_autocar_is_a_bus() {
        assert_eq!(TransportMode::from_cell("Car"), Some(TransportMode::Car));
        assert_eq!(TransportMode::from_cell("voiture"), Some(TransportMode::Car));
        assert_eq!(TransportMode::from_cell("Autocar"), Some(TransportMode::Bus));
        assert_eq!(TransportMode::from_cell("coach"), Some(TransportMode::Bus));
    }

    #[test]
    fn keeps_unknown_transport_verbatim() {
        assert_eq!(
            TransportMode::from_cell("Tuk-tuk"),
            Some(TransportMode::Other("Tuk-tuk".to_string()))
        );
    }

    #[test]
    fn blank_transport_is_none() {
        assert_eq!(TransportMode::from_cell("   "), None);
    }

    #[test]
    fn country_is_trailing_segment() {
        let stop = ResolvedStop {
            place: "Salzburg, Land Salzburg, Austria ".to_string(),
            title: String::new(),
            date: String::new(),
            description: String::new(),
            transport: None,
            coordinates: Coordinates::new(47.8, 13.04),
            when: NaiveDateTime::default(),
            date_format: DateFormat::Iso,
            mode: None,
            is_current: false,
        };
        assert_eq!(stop.country(), "Austria");
    }

    #[test]
    fn snapshot_entry_omits_missing_transport() {
        let entry = SnapshotEntry {
            lieu: "Paris, France".to_string(),
            titre: "Arrival".to_string(),
            date: "2024-01-01".to_string(),
            description: String::new(),
            transport: None,
            lat: 48.8566,
            lng: 2.3522,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("transport").is_none());
        assert_eq!(json["lieu"], "Paris, France");
    }
}
