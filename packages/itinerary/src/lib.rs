#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Itinerary pipeline: feed rows in, sorted stops and trip KPIs out.
//!
//! ```text
//! CSV feed ─▶ parse_rows ─▶ normalize (geocode, sort) ─▶ aggregate ─▶ TripView
//!                                   │
//!                                   └─▶ write_snapshot (batch mode)
//! ```
//!
//! Interactive runs either resolve the feed live through the geocode cache
//! or, when a snapshot from a batch run exists, load the snapshot and do no
//! geocoding at all. Both paths produce the same [`NormalizedItinerary`]
//! invariants.
//!
//! [`NormalizedItinerary`]: trip_map_itinerary_models::NormalizedItinerary

pub mod config;
pub mod geojson_export;
pub mod kpis;
pub mod normalize;
pub mod pipeline;
pub mod session;
pub mod snapshot;

use trip_map_geocode_cache::CacheError;
use trip_map_geocoder::GeocodeError;
use trip_map_itinerary_models::{NormalizedItinerary, TripKpis};
use trip_map_source::SourceError;

pub use session::{RefreshMode, TripSession};
pub use trip_map_source::progress::{LogProgress, ProgressCallback, null_progress};

/// Errors that abort an itinerary refresh.
///
/// Per-row problems (unknown place, unreadable date, malformed record) are
/// logged and absorbed; only feed, provider, storage, and configuration
/// failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum ItineraryError {
    /// Fetching or parsing the feed failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The geocoding provider or cache failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// Opening the geocode cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Reading or writing a snapshot or export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a snapshot or export failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A snapshot file exists but is not a valid snapshot.
    #[error("Invalid snapshot {path}: {message}")]
    Snapshot {
        /// Path of the offending file.
        path: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// The configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration is inconsistent.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Everything a renderer needs for one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TripView {
    pub itinerary: NormalizedItinerary,
    pub kpis: TripKpis,
}

impl TripView {
    /// Computes KPIs for `itinerary` and bundles them.
    #[must_use]
    pub fn new(itinerary: NormalizedItinerary) -> Self {
        let kpis = kpis::aggregate(&itinerary);
        Self { itinerary, kpis }
    }
}
