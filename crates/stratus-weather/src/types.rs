use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Normalized weather returned to clients and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// Provider's resolved address, not necessarily the query string
    pub location: String,
    pub temperature: f64,
    pub conditions: String,
    /// Percent
    pub humidity: f64,
    pub wind_speed: f64,
    /// RFC 3339 instant at which we fetched this record
    pub timestamp: String,
}

impl WeatherRecord {
    /// Map a provider payload, stamping it with `fetched_at`.
    ///
    /// The provider's own observation time is ignored.
    pub fn from_provider(payload: ProviderResponse, fetched_at: DateTime<Utc>) -> Self {
        let current = payload.current_conditions.unwrap_or_default();
        Self {
            location: payload.resolved_address.unwrap_or_default(),
            temperature: current.temp.unwrap_or_default(),
            conditions: current.conditions.unwrap_or_default(),
            humidity: current.humidity.unwrap_or_default(),
            wind_speed: current.windspeed.unwrap_or_default(),
            timestamp: fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Subset of the Visual Crossing timeline response we consume.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    #[serde(default)]
    pub resolved_address: Option<String>,
    #[serde(default)]
    pub current_conditions: Option<CurrentConditions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
}
