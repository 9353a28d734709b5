//! Cache Storage
//!
//! Generational response store shared by every worker version of an origin
//! and by the page. Entries are only ever written whole and only for HTTP 200
//! responses; nothing expires individually, whole generations are deleted
//! instead.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use spin::RwLock;

use crate::request::Response;

/// Default quota across all generations (50 MB).
pub const DEFAULT_QUOTA: usize = 50 * 1024 * 1024;

/// Per-entry bookkeeping overhead added to the body size.
const ENTRY_OVERHEAD: usize = 256;

/// Cache storage handle shared between worker versions and the page.
pub type SharedCacheStorage = Arc<RwLock<CacheStorage>>;

/// Cache storage error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Generation does not exist
    NotFound,
    /// Storing would exceed the quota
    QuotaExceeded { needed: usize, available: usize },
    /// Only HTTP 200 responses may be stored
    NotCacheable(u16),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "cache not found"),
            CacheError::QuotaExceeded { needed, available } => write!(
                f,
                "cache quota exceeded: need {} bytes, {} available",
                needed, available
            ),
            CacheError::NotCacheable(status) => {
                write!(f, "refusing to cache status {}", status)
            }
        }
    }
}

/// A single cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Key this entry is stored under (path plus query).
    pub key: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Timestamp (ms) when this entry was written.
    pub cached_at: u64,
    /// Size in bytes (body + overhead).
    pub size: usize,
}

impl CachedResponse {
    fn new(key: &str, response: &Response, cached_at: u64) -> Self {
        Self {
            key: String::from(key),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at,
            size: response.body.len() + ENTRY_OVERHEAD,
        }
    }

    /// Rebuild a servable response.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(self.status).with_body(self.body.clone());
        response.headers = self.headers.clone();
        response
    }
}

/// A named cache generation.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    entries: BTreeMap<String, CachedResponse>,
    total_size: usize,
}

impl Cache {
    fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            entries: BTreeMap::new(),
            total_size: 0,
        }
    }

    /// Generation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an entry by key.
    pub fn match_key(&self, key: &str) -> Option<&CachedResponse> {
        self.entries.get(key)
    }

    /// List all keys.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this generation is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of entries.
    pub fn size(&self) -> usize {
        self.total_size
    }

    /// Insert, replacing any entry under the same key. Returns the size delta.
    fn insert(&mut self, entry: CachedResponse) -> isize {
        let added = entry.size as isize;
        let removed = self
            .entries
            .insert(entry.key.clone(), entry)
            .map(|old| old.size as isize)
            .unwrap_or(0);
        self.total_size = (self.total_size as isize + added - removed) as usize;
        added - removed
    }
}

/// All generations of one origin.
#[derive(Debug)]
pub struct CacheStorage {
    caches: BTreeMap<String, Cache>,
    total_size: usize,
    quota: usize,
}

impl CacheStorage {
    /// Create storage with the default quota.
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA)
    }

    /// Create storage with an explicit quota in bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            caches: BTreeMap::new(),
            total_size: 0,
            quota,
        }
    }

    /// Wrap into a shareable handle.
    pub fn shared(self) -> SharedCacheStorage {
        Arc::new(RwLock::new(self))
    }

    /// Open (or create) a generation.
    pub fn open(&mut self, cache_name: &str) -> &mut Cache {
        self.caches
            .entry(String::from(cache_name))
            .or_insert_with(|| Cache::new(cache_name))
    }

    /// Get a generation without creating it.
    pub fn get(&self, cache_name: &str) -> Option<&Cache> {
        self.caches.get(cache_name)
    }

    /// Check if a generation exists.
    pub fn has(&self, cache_name: &str) -> bool {
        self.caches.contains_key(cache_name)
    }

    /// Delete a whole generation.
    pub fn delete(&mut self, cache_name: &str) -> bool {
        if let Some(cache) = self.caches.remove(cache_name) {
            self.total_size = self.total_size.saturating_sub(cache.size());
            true
        } else {
            false
        }
    }

    /// Delete every generation. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.caches.len();
        self.caches.clear();
        self.total_size = 0;
        removed
    }

    /// List all generation names.
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Store one response under `key`.
    pub fn put(
        &mut self,
        cache_name: &str,
        key: &str,
        response: &Response,
        cached_at: u64,
    ) -> Result<(), CacheError> {
        self.put_all(cache_name, &[(String::from(key), response.clone())], cached_at)
    }

    /// Store a batch atomically: either every entry lands or none does.
    pub fn put_all(
        &mut self,
        cache_name: &str,
        entries: &[(String, Response)],
        cached_at: u64,
    ) -> Result<(), CacheError> {
        if let Some((_, bad)) = entries.iter().find(|(_, r)| !r.is_cacheable()) {
            return Err(CacheError::NotCacheable(bad.status));
        }

        let staged: Vec<CachedResponse> = entries
            .iter()
            .map(|(key, response)| CachedResponse::new(key, response, cached_at))
            .collect();

        let replaced: usize = match self.caches.get(cache_name) {
            Some(cache) => staged
                .iter()
                .filter_map(|e| cache.match_key(&e.key))
                .map(|old| old.size)
                .sum(),
            None => 0,
        };
        let needed: usize = staged.iter().map(|e| e.size).sum();
        let available = self.quota.saturating_sub(self.total_size) + replaced;
        if needed > available {
            return Err(CacheError::QuotaExceeded { needed, available });
        }

        let cache = self.open(cache_name);
        let mut delta = 0isize;
        for entry in staged {
            delta += cache.insert(entry);
        }
        self.total_size = (self.total_size as isize + delta) as usize;

        Ok(())
    }

    /// Match a key in a specific generation.
    pub fn match_in(&self, cache_name: &str, key: &str) -> Option<&CachedResponse> {
        self.caches.get(cache_name)?.match_key(key)
    }

    /// Total storage used.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Configured quota.
    pub fn quota(&self) -> usize {
        self.quota
    }
}

impl Default for CacheStorage {
    fn default() -> Self {
        Self::new()
    }
}
