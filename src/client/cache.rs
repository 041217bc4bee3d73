//! In-memory response cache with lazy TTL eviction

use regex::Regex;
use reqwest::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Cache key: request method plus URL without the cache-busting parameter
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Request method
    pub method: Method,
    /// Resolved URL, cache buster excluded
    pub url: String,
}

impl CacheKey {
    /// Build a key
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.url)
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Response cache shared by every request of one fetch client
///
/// Entries are never swept proactively: an expired entry is dropped the next time
/// it is looked up. Writes are last-writer-wins.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, evicting it if it has expired
    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(key = %key, "evicting expired cache entry");
            entries.remove(key);
        }
        None
    }

    /// Store `value`, replacing any previous entry
    pub fn insert(&self, key: CacheKey, value: serde_json::Value) {
        self.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove every entry
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Remove every entry whose `METHOD:url` form matches `pattern`
    ///
    /// Returns the number of entries removed.
    pub fn remove_matching(&self, pattern: &Regex) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(&key.to_string()));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // a panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
