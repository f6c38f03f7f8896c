use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "STRATUS_CONFIG";

const DEFAULT_WEATHER_API_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Twelve hours.
const DEFAULT_CACHE_TTL_SECS: u64 = 43_200;

/// A setting that failed a check, keyed by its dotted path.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of `Config::validate`. Errors stop startup, warnings are logged.
#[derive(Debug, Clone, Default)]
pub struct ConfigReport {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ConfigIssue {
            field,
            message: message.into(),
        });
    }

    fn warn(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(ConfigIssue {
            field,
            message: message.into(),
        });
    }

    /// Warnings when valid, otherwise every error folded into one `Invalid`.
    pub fn into_result(self) -> Result<Vec<ConfigIssue>, ConfigError> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Invalid(joined))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listening socket
    #[serde(default)]
    pub server: ServerConfig,

    /// Weather provider settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Key-value cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Provider API key. Required; there is no usable default.
    #[serde(default)]
    pub api_key: String,

    /// Timeline endpoint; the escaped location is appended as a path segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Unit system requested from the provider
    #[serde(default = "default_unit_group")]
    pub unit_group: String,

    /// Detail level requested from the provider
    #[serde(default = "default_include")]
    pub include: String,

    /// Request timeout. `None` leaves the transport default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_WEATHER_API_URL.to_string()
}

fn default_unit_group() -> String {
    "metric".to_string()
}

fn default_include() -> String {
    "current".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            unit_group: default_unit_group(),
            include: default_include(),
            timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis `host:port`
    #[serde(default = "default_cache_addr")]
    pub addr: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub db: i64,

    /// Entry lifetime, enforced by the store
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on the startup liveness probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_cache_addr() -> String {
    "localhost:6379".to_string()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            addr: default_cache_addr(),
            password: None,
            db: 0,
            ttl_secs: default_ttl_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Build a `redis://[:password@]addr/db` connection URL.
    ///
    /// The password is percent-encoded.
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse(&format!("redis://{}/{}", self.addr, self.db))
            .map_err(|e| ConfigError::Invalid(format!("cache.addr: {}", e)))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| ConfigError::Invalid("cache.password: cannot be set on this address".into()))?;
        }

        Ok(url.to_string())
    }
}

impl Config {
    /// Load configuration from the optional file, `.env`, and process environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(_) => tracing::debug!("No .env file found, using environment variables"),
        }

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Reading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `load`, then refuse to start on any validation error.
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        let warnings = config.validate().into_result()?;

        for warning in &warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Overlay environment variables on top of the current values.
    ///
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("WEATHER_API_KEY") {
            self.upstream.api_key = v;
        }
        if let Some(v) = get("WEATHER_API_URL") {
            self.upstream.base_url = v;
        }
        if let Some(v) = get("REDIS_ADDR") {
            self.cache.addr = v;
        }
        if let Some(v) = get("REDIS_PASSWORD") {
            self.cache.password = Some(v);
        }
        if let Some(v) = get("REDIS_DB") {
            self.cache.db = parse_env("REDIS_DB", &v)?;
        }
        if let Some(v) = get("CACHE_EXPIRATION") {
            self.cache.ttl_secs = parse_env("CACHE_EXPIRATION", &v)?;
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        if self.upstream.api_key.trim().is_empty() {
            report.error(
                "upstream.api_key",
                "WEATHER_API_KEY environment variable is required",
            );
        }
        if let Some(problem) = http_url_problem(&self.upstream.base_url) {
            report.error("upstream.base_url", problem);
        }
        if self.upstream.timeout_secs == Some(0) {
            report.error("upstream.timeout_secs", "must be at least 1 second");
        }

        if self.server.port == 0 {
            report.error("server.port", "an ephemeral port cannot be advertised");
        }

        match self.cache.ttl_secs {
            0 => report.error("cache.ttl_secs", "must be at least 1 second"),
            t if t > 7 * 24 * 3600 => report.warn("cache.ttl_secs", "entries live longer than a week"),
            _ => {}
        }
        if self.cache.probe_timeout_secs == 0 {
            report.error("cache.probe_timeout_secs", "must be at least 1 second");
        }
        if self.cache.addr.trim().is_empty() {
            report.warn("cache.addr", "empty, responses will not be cached");
        } else if let Err(e) = self.cache.redis_url() {
            report.error("cache.addr", e.to_string());
        }

        report
    }

    /// `$STRATUS_CONFIG`, else `<config dir>/stratus/config.toml`
    fn config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }

        dirs::config_dir().map(|dir| dir.join("stratus").join("config.toml"))
    }
}

/// Why `value` is not a usable http(s) endpoint, if it isn't.
fn http_url_problem(value: &str) -> Option<String> {
    match Url::parse(value) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            Some(format!("expected http or https, got {}", url.scheme()))
        }
        Ok(url) if url.host().is_none() => Some("no host".to_string()),
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{}={:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.upstream.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.addr, "localhost:6379");
        assert_eq!(config.cache.ttl(), Duration::from_secs(43_200));
        assert_eq!(config.upstream.unit_group, "metric");
        assert_eq!(config.upstream.include, "current");
        assert!(config.upstream.timeout().is_none());
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let result = Config::default().validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "upstream.api_key"));
    }

    #[test]
    fn test_configured_is_valid() {
        let result = configured().validate();
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_base_url_scheme() {
        let mut config = configured();
        config.upstream.base_url = "ftp://weather.example.com".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
        assert_eq!(http_url_problem("https://example.com/x"), None);
        assert!(http_url_problem("not a url").is_some());
    }

    #[test]
    fn test_zero_ttl_is_error() {
        let mut config = configured();
        config.cache.ttl_secs = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "cache.ttl_secs"));
    }

    #[test]
    fn test_empty_cache_addr_is_warning() {
        let mut config = configured();
        config.cache.addr = String::new();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "cache.addr"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("WEATHER_API_KEY", "abc"),
                ("REDIS_ADDR", "cache.internal:6380"),
                ("REDIS_DB", "2"),
                ("CACHE_EXPIRATION", "600"),
                ("PORT", "9090"),
            ]))
            .unwrap();

        assert_eq!(config.upstream.api_key, "abc");
        assert_eq!(config.cache.addr, "cache.internal:6380");
        assert_eq!(config.cache.db, 2);
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("PORT", "")])).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_unparseable_env_value_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("CACHE_EXPIRATION", "twelve hours")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("CACHE_EXPIRATION"));
    }

    #[test]
    fn test_redis_url_without_password() {
        let config = CacheConfig::default();
        assert_eq!(config.redis_url().unwrap(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_redis_url_with_password() {
        let config = CacheConfig {
            password: Some("s3cret".to_string()),
            db: 3,
            ..CacheConfig::default()
        };
        assert_eq!(config.redis_url().unwrap(), "redis://:s3cret@localhost:6379/3");
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\napi_key = \"from-file\"\n\n[cache]\nttl_secs = 60\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.upstream.api_key, "from-file");
        assert_eq!(config.upstream.unit_group, "metric");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.addr, "localhost:6379");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_report_folds_errors_into_invalid() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;

        let err = config.validate().into_result().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let text = err.to_string();
        assert!(text.contains("upstream.api_key"));
        assert!(text.contains("cache.ttl_secs"));
    }

    #[test]
    fn test_report_passes_warnings_through() {
        let mut config = configured();
        config.cache.addr = "  ".to_string();
        let warnings = config.validate().into_result().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "cache.addr");
    }
}
