//! Error types for Stratus.
//!
//! - `ValidationError` for bad client input
//! - `WeatherError` for anything between us and the upstream provider
//! - `CacheError` for the key-value store (logged, never shown to clients)
//! - `ConfigError` for startup configuration
//!
//! `AppError` is what the HTTP layer turns into a response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

/// Bad or missing client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Location parameter is required")]
    MissingLocation,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

/// Failures talking to the upstream weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Provider answered with a non-200 status.
    #[error("API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// DNS, connection refused, reset, TLS and similar.
    #[error("failed to fetch weather data: {0}")]
    Transport(String),

    /// Location cannot be expressed as a single path segment.
    #[error("location {0:?} cannot be sent to the provider")]
    UnsupportedLocation(String),

    /// Provider body was not the JSON we expect.
    #[error("failed to decode API response: {0}")]
    Decode(String),

    /// Our own record could not be serialized.
    #[error("failed to encode weather record: {0}")]
    Encode(String),
}

/// Key-value store errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

/// Extension trait for converting reqwest errors to our error types.
///
/// The request URL is stripped first: it carries the provider API key.
pub trait ReqwestErrorExt {
    fn into_weather_error(self) -> WeatherError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_weather_error(self) -> WeatherError {
        let err = self.without_url();
        if err.is_decode() {
            WeatherError::Decode(err.to_string())
        } else {
            WeatherError::Transport(err.to_string())
        }
    }
}
