#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place-name geocoding for itinerary stops.
//!
//! Resolution goes cache first, then one live request to the provider:
//!
//! 1. The trimmed place name is looked up in a
//!    [`GeocodeStore`](trip_map_geocode_cache::GeocodeStore). A hit returns
//!    immediately and never waits on the rate limiter.
//! 2. On a miss, the [`rate_limit::RateLimiter`] spaces the request from the
//!    previous live lookup, then a single [`PlaceLookup`] call is made and
//!    its first result is taken.
//! 3. A found place is written to the cache. A place with no results is
//!    not cached, so it is retried on the next run.
//!
//! Providers are configured by TOML files in `services/`, loaded through
//! the [`service_registry`].

pub mod nominatim;
pub mod rate_limit;
pub mod resolver;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;
use trip_map_geocode_cache::CacheError;
use trip_map_itinerary_models::Coordinates;

pub use resolver::{GeocodeResolver, ResolverStats};

/// A geocoding result with coordinates and the provider's label for it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub coordinates: Coordinates,
    /// The matched/canonical name returned by the provider.
    pub display_name: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Geocoder returned HTTP {status}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Reading or writing the geocode cache failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// A single live request to a geocoding provider.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Searches for `query` and returns the provider's first result.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the response cannot
    /// be parsed. Zero results is `Ok(None)`, not an error.
    async fn lookup(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;
}

/// Resolves a free-text place name to coordinates.
///
/// This is the seam the itinerary normalizer depends on; the production
/// implementation is [`GeocodeResolver`].
#[async_trait]
pub trait PlaceResolver: Send {
    /// Returns the position of `place`, or `None` if it cannot be found.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport, provider, or cache failure.
    async fn resolve(&mut self, place: &str) -> Result<Option<Coordinates>, GeocodeError>;
}
