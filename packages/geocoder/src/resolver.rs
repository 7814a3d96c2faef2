//! Cache-first, rate-limited place resolution.

use async_trait::async_trait;
use trip_map_geocode_cache::{GeocodeStore, cache_key};
use trip_map_itinerary_models::Coordinates;

use crate::rate_limit::RateLimiter;
use crate::service_registry::GeocodingService;
use crate::{GeocodeError, PlaceLookup, PlaceResolver};

/// Counters for one resolver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Lookups answered from the store.
    pub cache_hits: u64,
    /// Requests sent to the provider.
    pub live_lookups: u64,
    /// Live lookups that returned no result.
    pub not_found: u64,
}

/// Resolves place names through a [`GeocodeStore`], falling back to one
/// live [`PlaceLookup`] per miss.
pub struct GeocodeResolver<L, S> {
    lookup: L,
    store: S,
    limiter: RateLimiter,
    stats: ResolverStats,
}

impl<L: PlaceLookup, S: GeocodeStore> GeocodeResolver<L, S> {
    #[must_use]
    pub const fn new(lookup: L, store: S, limiter: RateLimiter) -> Self {
        Self {
            lookup,
            store,
            limiter,
            stats: ResolverStats {
                cache_hits: 0,
                live_lookups: 0,
                not_found: 0,
            },
        }
    }

    /// Builds a resolver that honours the service's request spacing.
    #[must_use]
    pub fn for_service(lookup: L, store: S, service: &GeocodingService) -> Self {
        Self::new(lookup, store, RateLimiter::from_millis(service.rate_limit_ms()))
    }

    #[must_use]
    pub const fn stats(&self) -> ResolverStats {
        self.stats
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the resolver, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }
}

#[async_trait]
impl<L: PlaceLookup, S: GeocodeStore> PlaceResolver for GeocodeResolver<L, S> {
    async fn resolve(&mut self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let key = cache_key(place);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(hit) = self.store.get(key)? {
            log::debug!("Geocode cache hit for '{key}'");
            self.stats.cache_hits += 1;
            return Ok(Some(hit));
        }

        self.limiter.acquire().await;
        self.stats.live_lookups += 1;

        match self.lookup.lookup(key).await? {
            Some(found) => {
                log::info!(
                    "Geocoded '{key}' -> {:.5}, {:.5}{}",
                    found.coordinates.latitude,
                    found.coordinates.longitude,
                    found
                        .display_name
                        .as_deref()
                        .map(|n| format!(" ({n})"))
                        .unwrap_or_default()
                );
                self.store.put(key, found.coordinates)?;
                Ok(Some(found.coordinates))
            }
            None => {
                log::info!("Geocoder found no match for '{key}'");
                self.stats.not_found += 1;
                Ok(None)
            }
        }
    }
}
