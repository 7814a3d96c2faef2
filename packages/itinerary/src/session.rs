//! Per-process context for itinerary refreshes.
//!
//! A [`TripSession`] owns the configuration, the HTTP client, and the date
//! used for unreadable date cells. Each refresh opens its own resolver, so
//! rate-limit state and cache handles live only as long as one refresh.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use trip_map_geocode_cache::GeocodeStore;
use trip_map_geocoder::nominatim::NominatimClient;
use trip_map_geocoder::{GeocodeResolver, PlaceResolver};
use trip_map_itinerary_models::Coordinates;
use trip_map_source::SourceError;
use trip_map_source::progress::ProgressCallback;

use crate::config::TripConfig;
use crate::{ItineraryError, TripView, pipeline};

/// Resolver over the configured provider and cache backend.
pub type ConfiguredResolver = GeocodeResolver<NominatimClient, Box<dyn GeocodeStore>>;

const FEED_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a refresh gets its stops from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// Snapshot if one exists, otherwise live.
    #[default]
    Auto,
    /// Always download the feed and geocode through the cache.
    Live,
    /// Only read the snapshot.
    Snapshot,
}

pub struct TripSession {
    config: TripConfig,
    client: reqwest::Client,
    today: NaiveDate,
}

impl TripSession {
    /// Creates a session dated today in local time.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: TripConfig) -> Result<Self, ItineraryError> {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(SourceError::from)?;

        Ok(Self {
            config,
            client,
            today: chrono::Local::now().date_naive(),
        })
    }

    /// Overrides the date used for unreadable date cells.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &TripConfig {
        &self.config
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Opens the cache and builds a resolver for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is misconfigured or the cache cannot
    /// be opened.
    pub fn resolver(&self) -> Result<ConfiguredResolver, ItineraryError> {
        let service = self.config.geocoder.resolve_service()?;
        log::debug!(
            "Using geocoding service '{}' at {} ({} ms spacing)",
            service.id,
            service.base_url(),
            service.rate_limit_ms()
        );

        let lookup = NominatimClient::from_service(&service)?;
        let store = self.config.open_store()?;
        Ok(GeocodeResolver::for_service(lookup, store, &service))
    }

    /// Runs one refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen source cannot be loaded or resolved.
    pub async fn refresh(
        &self,
        mode: RefreshMode,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<TripView, ItineraryError> {
        let snapshot = &self.config.snapshot_path;
        let use_snapshot = match mode {
            RefreshMode::Live => false,
            RefreshMode::Snapshot => true,
            RefreshMode::Auto => snapshot.exists(),
        };

        if use_snapshot {
            pipeline::refresh_from_snapshot(snapshot, self.today)
        } else {
            self.refresh_live(progress).await
        }
    }

    async fn refresh_live(
        &self,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<TripView, ItineraryError> {
        let mut resolver = self.resolver()?;
        let view = pipeline::refresh_live(
            &self.client,
            &self.config.feed_url,
            &mut resolver,
            progress,
            self.today,
        )
        .await?;
        log_stats(&resolver);
        Ok(view)
    }

    /// Batch mode: live refresh, then write the snapshot to `output` or the
    /// configured snapshot path.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or the snapshot cannot be
    /// written.
    pub async fn precompute(
        &self,
        output: Option<&Path>,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<TripView, ItineraryError> {
        let output = output.unwrap_or(self.config.snapshot_path.as_path());
        let mut resolver = self.resolver()?;
        let view = pipeline::precompute(
            &self.client,
            &self.config.feed_url,
            &mut resolver,
            output,
            progress,
            self.today,
        )
        .await?;
        log_stats(&resolver);
        Ok(view)
    }

    /// Resolves a single place through the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache or provider fails.
    pub async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, ItineraryError> {
        let mut resolver = self.resolver()?;
        Ok(resolver.resolve(place).await?)
    }
}

fn log_stats(resolver: &ConfiguredResolver) {
    let stats = resolver.stats();
    log::info!(
        "Geocoding: {} cache hits, {} live lookups, {} not found",
        stats.cache_hits,
        stats.live_lookups,
        stats.not_found
    );
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use trip_map_source::progress::null_progress;

    use super::*;
    use crate::config::CacheBackend;

    const PRE_RESOLVED_FEED: &str = "\
lieu,titre,date,description,lat,lng
\"Vienna, Austria\",Opera,2024-01-05,Evening,48.2082,16.3738
\"Paris, France\",Departure,2024-01-01,Leaving,48.8566,2.3522
";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trip_map_session_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn session(dir: &Path) -> TripSession {
        let feed = dir.join("feed.csv");
        std::fs::write(&feed, PRE_RESOLVED_FEED).unwrap();

        let config = TripConfig {
            feed_url: feed.to_string_lossy().into_owned(),
            snapshot_path: dir.join("data.json"),
            cache_path: dir.join("cache.json"),
            cache_backend: CacheBackend::Memory,
            ..TripConfig::default()
        };
        TripSession::new(config)
            .unwrap()
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn auto_mode_goes_live_without_a_snapshot() {
        let dir = temp_dir();
        let session = session(&dir);

        let view = session.refresh(RefreshMode::Auto, &null_progress()).await.unwrap();
        assert_eq!(view.itinerary.len(), 2);
        assert_eq!(view.itinerary.current().unwrap().place, "Vienna, Austria");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn auto_mode_prefers_the_snapshot() {
        let dir = temp_dir();
        let session = session(&dir);

        let live = session.precompute(None, &null_progress()).await.unwrap();
        assert!(session.config().snapshot_path.exists());

        std::fs::remove_file(dir.join("feed.csv")).unwrap();
        let view = session.refresh(RefreshMode::Auto, &null_progress()).await.unwrap();
        assert_eq!(view, live);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn snapshot_mode_requires_a_snapshot() {
        let dir = temp_dir();
        let session = session(&dir);

        let result = session.refresh(RefreshMode::Snapshot, &null_progress()).await;
        assert!(matches!(result, Err(ItineraryError::Io(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn precompute_honours_explicit_output() {
        let dir = temp_dir();
        let session = session(&dir);
        let output = dir.join("out").join("snapshot.json");

        session.precompute(Some(&output), &null_progress()).await.unwrap();
        assert!(output.exists());
        assert!(!session.config().snapshot_path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn blank_place_geocodes_to_none_without_network() {
        let dir = temp_dir();
        let session = session(&dir);
        assert_eq!(session.geocode("   ").await.unwrap(), None);
        std::fs::remove_dir_all(&dir).ok();
    }
}
