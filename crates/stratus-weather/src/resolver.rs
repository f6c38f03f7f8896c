//! Cache-aside lookup: serve from the cache, otherwise fetch upstream and populate.

use std::sync::Arc;
use std::time::Duration;
use stratus_core::WeatherError;
use tracing::instrument;

use crate::cache::CacheStore;
use crate::provider::WeatherSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Serialized `WeatherRecord` plus where it came from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub body: Vec<u8>,
    pub status: CacheStatus,
}

/// Shared across all requests.
///
/// Concurrent misses for one key each go upstream; the last write wins.
pub struct WeatherResolver {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn WeatherSource>,
    ttl: Duration,
}

impl WeatherResolver {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn WeatherSource>, ttl: Duration) -> Self {
        Self { cache, source, ttl }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Serialized record for `location`, verbatim from the cache on a hit.
    pub async fn resolve(&self, location: &str) -> Result<Vec<u8>, WeatherError> {
        self.lookup(location).await.map(|resolved| resolved.body)
    }

    /// Like `resolve`, also reporting hit or miss.
    ///
    /// Upstream failures are returned and never cached. Cache write failures
    /// are logged and do not affect the result.
    #[instrument(skip(self), level = "info")]
    pub async fn lookup(&self, location: &str) -> Result<Resolved, WeatherError> {
        let enabled = self.cache.is_enabled();

        if enabled {
            if let Some(body) = self.cache.get(location).await {
                tracing::info!("Cache hit for location: {}", location);
                return Ok(Resolved {
                    body,
                    status: CacheStatus::Hit,
                });
            }
        }

        tracing::info!("Cache miss for location: {}, fetching from API", location);
        let record = self.source.fetch(location).await.map_err(|e| {
            tracing::error!("Error fetching weather: {}", e);
            e
        })?;

        let body =
            serde_json::to_vec(&record).map_err(|e| WeatherError::Encode(e.to_string()))?;

        if enabled {
            if let Err(e) = self.cache.set(location, &body, self.ttl).await {
                tracing::warn!("Error caching data for {}: {}", location, e);
            }
        }

        Ok(Resolved {
            body,
            status: CacheStatus::Miss,
        })
    }
}
