//! Configuration types for news-pager

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the article API base URL
pub const ENV_API_URL: &str = "NEWS_API_URL";
/// Environment variable overriding the response cache TTL, in seconds
pub const ENV_CACHE_TTL_SECS: &str = "NEWS_API_CACHE_TTL_SECS";
/// Environment variable overriding the HTTP timeout, in seconds
pub const ENV_TIMEOUT_SECS: &str = "NEWS_API_TIMEOUT_SECS";
/// Environment variable overriding the page size
pub const ENV_PAGE_SIZE: &str = "NEWS_PAGE_SIZE";

/// Main configuration for the loading pipeline
///
/// Fields are organized into sub-configs:
/// - [`http`](HttpConfig) - transport settings
/// - [`cache`](CacheConfig) - response cache
/// - [`paging`](PagingConfig) - initial query
/// - [`scroll`](ScrollConfig) - infinite-scroll trigger tuning
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the article API (e.g. "https://news.example.com/api")
    pub api_base_url: String,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Initial query and page size
    #[serde(default)]
    pub paging: PagingConfig,

    /// Scroll trigger settings
    #[serde(default)]
    pub scroll: ScrollConfig,
}

impl Config {
    /// Create a configuration with defaults for everything but the base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from the process environment
    ///
    /// `NEWS_API_URL` is required; the TTL, timeout and page size variables are
    /// optional overrides. The result is validated before it is returned.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when a variable is missing or malformed.
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var(ENV_API_URL)
            .map_err(|_| Error::config(format!("{ENV_API_URL} is not set"), "api_base_url"))?;

        let mut config = Config::new(api_base_url);

        if let Some(secs) = env_u64(ENV_CACHE_TTL_SECS, "cache.ttl")? {
            config.cache.ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64(ENV_TIMEOUT_SECS, "http.timeout")? {
            config.http.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = env_u64(ENV_PAGE_SIZE, "paging.page_size")? {
            config.paging.page_size = u32::try_from(size)
                .map_err(|_| Error::config("page size out of range", "paging.page_size"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot work with
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(Error::config("base URL must not be empty", "api_base_url"));
        }
        url::Url::parse(base).map_err(|e| {
            Error::config(format!("invalid base URL '{base}': {e}"), "api_base_url")
        })?;

        if self.paging.page_size == 0 {
            return Err(Error::config(
                "page size must be at least 1",
                "paging.page_size",
            ));
        }

        if !(0.0..=1.0).contains(&self.scroll.threshold) {
            return Err(Error::config(
                format!("threshold {} is outside [0, 1]", self.scroll.threshold),
                "scroll.threshold",
            ));
        }

        if self.scroll.root_margin_px < 0.0 {
            return Err(Error::config(
                "root margin must not be negative",
                "scroll.root_margin_px",
            ));
        }

        Ok(())
    }
}

/// HTTP transport configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// Per-request timeout (default: 30 seconds)
    #[serde(with = "duration_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Response cache configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Enable the in-memory GET cache (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Age after which a cached response is treated as absent (default: 5 minutes)
    #[serde(with = "duration_serde", default = "default_cache_ttl")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: default_cache_ttl(),
        }
    }
}

/// Initial query used when a controller is created
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PagingConfig {
    /// Items per page (default: 6)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Category selected on startup
    #[serde(default)]
    pub initial_category: Option<String>,

    /// Search text entered on startup
    #[serde(default)]
    pub initial_query: Option<String>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_category: None,
            initial_query: None,
        }
    }
}

/// Scroll trigger tuning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScrollConfig {
    /// Minimum visible fraction of the sentinel that counts as visible (default: 0.01)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Lookahead added below and above the viewport, in pixels (default: 100)
    #[serde(default = "default_root_margin")]
    pub root_margin_px: f64,

    /// Minimum delay between two triggers, in milliseconds (default: 800)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl ScrollConfig {
    /// Cooldown as a [`Duration`]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            root_margin_px: default_root_margin(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

fn env_u64(var: &str, key: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::config(format!("{var}='{raw}' is not a number: {e}"), key)),
        Err(_) => Ok(None),
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("news-pager/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_page_size() -> u32 {
    6
}

fn default_threshold() -> f64 {
    0.01
}

fn default_root_margin() -> f64 {
    100.0
}

fn default_cooldown_ms() -> u64 {
    800
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::remove_var(ENV_API_URL);
            std::env::remove_var(ENV_CACHE_TTL_SECS);
            std::env::remove_var(ENV_TIMEOUT_SECS);
            std::env::remove_var(ENV_PAGE_SIZE);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("http://localhost:8000");
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert!(config.cache.enabled);
        assert_eq!(config.paging.page_size, 6);
        assert_eq!(config.scroll.threshold, 0.01);
        assert_eq!(config.scroll.root_margin_px, 100.0);
        assert_eq!(config.scroll.cooldown(), Duration::from_millis(800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"api_base_url":"http://localhost:8000","cache":{"ttl":10}}"#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl, Duration::from_secs(10));
        assert!(config.cache.enabled);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.paging, PagingConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new("");
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "api_base_url"
        ));

        config.api_base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.api_base_url = "http://localhost:8000".into();
        config.paging.page_size = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "paging.page_size"
        ));

        config.paging.page_size = 6;
        config.scroll.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "scroll.threshold"
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_base_url() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::set_var(ENV_API_URL, "http://localhost:8000");
            std::env::set_var(ENV_CACHE_TTL_SECS, "42");
            std::env::set_var(ENV_PAGE_SIZE, "9");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.cache.ttl, Duration::from_secs(42));
        assert_eq!(config.paging.page_size, 9);
        assert_eq!(config.http.timeout, Duration::from_secs(30));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_number() {
        clear_env();
        // SAFETY: env tests are serialized with #[serial]
        unsafe {
            std::env::set_var(ENV_API_URL, "http://localhost:8000");
            std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        }

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            Error::Config { key: Some(k), .. } if k == "http.timeout"
        ));

        clear_env();
    }
}
