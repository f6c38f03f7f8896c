use anyhow::{Context, Result};
use std::sync::Arc;
use stratus_core::Config;
use stratus_server::AppState;
use stratus_weather::{RedisCache, WeatherProvider, WeatherResolver};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    stratus_core::init()?;

    let config = Config::load_validated()?;

    let cache = if config.cache.addr.trim().is_empty() {
        tracing::warn!("No cache address configured. Running without cache.");
        RedisCache::disabled()
    } else {
        let url = config.cache.redis_url()?;
        RedisCache::connect(&url, config.cache.probe_timeout()).await
    };

    let provider = WeatherProvider::new(&config.upstream)?;
    let resolver = WeatherResolver::new(Arc::new(cache), Arc::new(provider), config.cache.ttl());

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Weather API server starting on port {}", config.server.port);
    stratus_server::serve(listener, AppState::new(Arc::new(resolver))).await
}
