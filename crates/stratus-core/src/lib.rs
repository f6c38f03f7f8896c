pub mod config;
pub mod error;

pub use config::{CacheConfig, Config, ConfigIssue, ConfigReport, ServerConfig, UpstreamConfig};
pub use error::{
    AppError, CacheError, ConfigError, ReqwestErrorExt, ValidationError, WeatherError,
};

use anyhow::Result;

/// Initialize process-wide logging.
///
/// Honors `RUST_LOG`, falling back to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Stratus core initialized");
    Ok(())
}
