//! Runtime configuration.
//!
//! Loaded from an optional TOML file; every field has a default. A few
//! environment variables override the file, and CLI flags override both.
//!
//! ```toml
//! feed_url = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"
//! snapshot_path = "data/data.json"
//! cache_path = "data/geocode_cache.json"
//! cache_backend = "json"
//!
//! [geocoder]
//! service = "nominatim"
//! rate_limit_ms = 1100
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use trip_map_geocode_cache::{GeocodeStore, MemoryStore, json_file::JsonFileStore, paths};
use trip_map_geocoder::service_registry::{self, GeocodingService, ProviderConfig};

use crate::ItineraryError;

/// Published CSV export of the itinerary spreadsheet.
pub const DEFAULT_FEED_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSiSiZP3r783Jcfoi6vPq03yNaGD30a6PdTK4mh06WpCb0wxIuhufWWtw82TdwU1iKoGYzElY0t1JfW/pub?gid=0&single=true&output=csv";

const ENV_FEED_URL: &str = "TRIP_MAP_FEED_URL";
const ENV_SNAPSHOT: &str = "TRIP_MAP_SNAPSHOT";
const ENV_CACHE: &str = "TRIP_MAP_CACHE";

/// Where resolved place positions are persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// JSON object file at `cache_path`.
    #[default]
    Json,
    /// Process-lifetime only.
    Memory,
    /// Embedded `DuckDB` table at `cache_path`. Requires the `duckdb`
    /// feature.
    Duckdb,
}

/// Overrides for the geocoding service picked from the embedded registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    /// Registry id; the highest-priority enabled service when unset.
    pub service: Option<String>,
    pub base_url: Option<String>,
    pub rate_limit_ms: Option<u64>,
    pub user_agent: Option<String>,
}

impl GeocoderSettings {
    /// Looks up the configured service and applies the overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ItineraryError::Config`] if the named service does not
    /// exist or no service is enabled.
    pub fn resolve_service(&self) -> Result<GeocodingService, ItineraryError> {
        let mut service = match &self.service {
            Some(id) => service_registry::service_by_id(id).ok_or_else(|| {
                ItineraryError::Config {
                    message: format!("Unknown geocoding service '{id}'"),
                }
            })?,
            None => service_registry::default_service().ok_or_else(|| ItineraryError::Config {
                message: "No enabled geocoding service".to_string(),
            })?,
        };

        match &mut service.provider {
            ProviderConfig::Nominatim {
                base_url,
                rate_limit_ms,
                user_agent,
            } => {
                if let Some(url) = &self.base_url {
                    base_url.clone_from(url);
                }
                if let Some(ms) = self.rate_limit_ms {
                    *rate_limit_ms = ms;
                }
                if let Some(agent) = &self.user_agent {
                    user_agent.clone_from(agent);
                }
            }
        }

        Ok(service)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    /// CSV feed URL, or a local file path.
    pub feed_url: String,
    pub snapshot_path: PathBuf,
    pub cache_path: PathBuf,
    pub cache_backend: CacheBackend,
    pub geocoder: GeocoderSettings,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            snapshot_path: paths::snapshot_path(),
            cache_path: paths::geocode_cache_path(),
            cache_backend: CacheBackend::default(),
            geocoder: GeocoderSettings::default(),
        }
    }
}

impl TripConfig {
    /// Loads the configuration file (if any) and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ItineraryError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a configuration document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ItineraryError::Toml`] if the document is not valid.
    pub fn from_toml_str(text: &str) -> Result<Self, ItineraryError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `TRIP_MAP_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_FEED_URL).filter(|v| !v.trim().is_empty()) {
            log::debug!("{ENV_FEED_URL} overrides feed_url");
            self.feed_url = url;
        }
        if let Some(path) = lookup(ENV_SNAPSHOT).filter(|v| !v.trim().is_empty()) {
            log::debug!("{ENV_SNAPSHOT} overrides snapshot_path");
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_CACHE).filter(|v| !v.trim().is_empty()) {
            log::debug!("{ENV_CACHE} overrides cache_path");
            self.cache_path = PathBuf::from(path);
        }
    }

    /// Opens the configured geocode cache backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be opened, or
    /// [`ItineraryError::Config`] if `duckdb` is requested in a build
    /// without that feature.
    pub fn open_store(&self) -> Result<Box<dyn GeocodeStore>, ItineraryError> {
        match self.cache_backend {
            CacheBackend::Json => Ok(Box::new(JsonFileStore::open(&self.cache_path)?)),
            CacheBackend::Memory => Ok(Box::new(MemoryStore::new())),
            #[cfg(feature = "duckdb")]
            CacheBackend::Duckdb => Ok(Box::new(
                trip_map_geocode_cache::duckdb_store::DuckDbStore::open(&self.cache_path)?,
            )),
            #[cfg(not(feature = "duckdb"))]
            CacheBackend::Duckdb => Err(ItineraryError::Config {
                message: "cache_backend = \"duckdb\" requires the duckdb feature".to_string(),
            }),
        }
    }
}
