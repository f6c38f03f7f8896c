//! Visual Crossing timeline client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use stratus_core::{ReqwestErrorExt, UpstreamConfig, WeatherError};
use tracing::instrument;

use crate::types::{ProviderResponse, WeatherRecord};

/// Anything that can produce a fresh `WeatherRecord` for a location name.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<WeatherRecord, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    api_key: String,
    unit_group: String,
    include: String,
}

impl WeatherProvider {
    /// Build a client from upstream settings.
    ///
    /// No timeout is set unless `timeout_secs` is configured.
    pub fn new(config: &UpstreamConfig) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| e.into_weather_error())?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            unit_group: config.unit_group.clone(),
            include: config.include.clone(),
        })
    }

    /// Full request URL for a location. Contains the API key; do not log.
    pub fn request_url(&self, location: &str) -> String {
        format!(
            "{}/{}?key={}&unitGroup={}&include={}",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.unit_group),
            urlencoding::encode(&self.include),
        )
    }

    /// Single GET against the provider, no retry.
    ///
    /// `.` and `..` are refused without a request: they survive escaping and
    /// the URL parser would resolve them against the base path.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, location: &str) -> Result<WeatherRecord, WeatherError> {
        if is_dot_segment(location) {
            return Err(WeatherError::UnsupportedLocation(location.to_string()));
        }

        let response = self
            .client
            .get(self.request_url(location))
            .send()
            .await
            .map_err(|e| e.into_weather_error())?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Provider returned {} for {}", status, location);
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| e.into_weather_error())?;
        let payload: ProviderResponse =
            serde_json::from_slice(&bytes).map_err(|e| WeatherError::Decode(e.to_string()))?;

        let record = WeatherRecord::from_provider(payload, Utc::now());
        tracing::debug!("Fetched weather for {} as {}", location, record.location);
        Ok(record)
    }
}

fn is_dot_segment(location: &str) -> bool {
    matches!(location, "." | "..")
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn fetch(&self, location: &str) -> Result<WeatherRecord, WeatherError> {
        WeatherProvider::fetch(self, location).await
    }
}
