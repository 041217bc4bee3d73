//! HTTP fetch client with a short-lived response cache.
//!
//! [`FetchClient`] resolves endpoints against the configured base URL, adds a
//! cache-busting parameter to GET requests so intermediate HTTP caches are bypassed,
//! and keeps its own application-level cache of parsed JSON keyed by method and URL
//! (without the cache buster).
//!
//! Every outcome is returned as a [`Result`]: HTTP failures, transport failures and
//! malformed bodies become [`Error::Http`], [`Error::Network`] and [`Error::Decode`].
//! A request whose [`CancellationToken`] fires resolves to [`Error::Cancelled`] and
//! the in-flight transport future is dropped.

mod cache;

pub use cache::{CacheKey, ResponseCache};

use crate::config::Config;
use crate::error::{Error, ErrorBody, Result};
use regex::Regex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Query parameter used to defeat intermediate HTTP caches
pub const CACHE_BUSTER_PARAM: &str = "_t";

/// Per-request options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    /// Read from and write to the response cache (GET only, default: true)
    ///
    /// `false` gives `no-store` semantics: the cache is neither consulted nor filled.
    pub cacheable: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { cacheable: true }
    }
}

impl RequestOptions {
    /// Bypass the response cache for this request
    pub fn no_store() -> Self {
        Self { cacheable: false }
    }
}

/// HTTP client for the article API
#[derive(Debug)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    cache: ResponseCache,
    cache_enabled: bool,
}

impl FetchClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be
    /// created.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.http.timeout)
            .user_agent(config.http.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            cache: ResponseCache::new(config.cache.ttl),
            cache_enabled: config.cache.enabled,
        })
    }

    /// Base URL every relative endpoint is joined to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an endpoint to a full URL
    ///
    /// Absolute `http://` / `https://` endpoints are returned unchanged.
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    /// GET `endpoint` and decode the JSON response
    ///
    /// # Errors
    /// See [`FetchClient::request`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<T> {
        self.request(endpoint, Method::GET, None, cancel, RequestOptions::default())
            .await
    }

    /// Perform a request and decode the JSON response
    ///
    /// GET requests consult the response cache first (unless `options` opt out) and
    /// store successful responses in it. Other methods always hit the network.
    ///
    /// # Errors
    /// - [`Error::Cancelled`] if `cancel` fires before the response is read
    /// - [`Error::Http`] for non-2xx statuses, carrying the server's `error` field or
    ///   `"Error <status>: <reason>"`
    /// - [`Error::Network`] for transport failures
    /// - [`Error::Decode`] for bodies that are not the expected JSON
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        cancel: Option<&CancellationToken>,
        options: RequestOptions,
    ) -> Result<T> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        let url = self.resolve(endpoint);
        let use_cache = method == Method::GET && options.cacheable && self.cache_enabled;
        let key = CacheKey::new(method.clone(), url.clone());

        if use_cache && let Some(value) = self.cache.get(&key) {
            debug!(key = %key, "response cache hit");
            return Ok(serde_json::from_value(value)?);
        }

        let target = if method == Method::GET {
            with_cache_buster(&url)
        } else {
            url
        };

        debug!(method = %method, url = %target, "sending request");

        let value = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(key = %key, "request cancelled");
                        return Err(Error::Cancelled);
                    }
                    result = self.send(method, &target, body) => result?,
                }
            }
            None => self.send(method, &target, body).await?,
        };

        if use_cache {
            self.cache.insert(key, value.clone());
        }

        Ok(serde_json::from_value(value)?)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "request failed");
            Error::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = ErrorBody::parse(&bytes).unwrap_or_else(|| {
                format!(
                    "Error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
            });
            warn!(url = %url, status = status.as_u16(), message = %message, "HTTP error");
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Drop cached responses
    ///
    /// With `None` the whole cache is cleared. With an endpoint, every entry (any
    /// method) whose URL starts with the resolved endpoint is removed. Returns the
    /// number of entries removed.
    pub fn invalidate_cache(&self, endpoint: Option<&str>) -> usize {
        match endpoint {
            None => {
                let removed = self.cache.clear();
                debug!(removed, "response cache cleared");
                removed
            }
            Some(endpoint) => {
                let prefix = regex::escape(&self.resolve(endpoint));
                let removed = Regex::new(&format!("^[A-Z]+:{prefix}"))
                    .map(|pattern| self.cache.remove_matching(&pattern))
                    .unwrap_or_else(|e| {
                        warn!(endpoint, error = %e, "invalid cache invalidation pattern");
                        0
                    });
                debug!(endpoint, removed, "response cache entries invalidated");
                removed
            }
        }
    }

    /// Number of stored cache entries
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Append `_t=<unix millis>` unless a cache buster is already present
fn with_cache_buster(url: &str) -> String {
    if url.contains(&format!("{CACHE_BUSTER_PARAM}=")) {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{sep}{CACHE_BUSTER_PARAM}={}",
        chrono::Utc::now().timestamp_millis()
    )
}
