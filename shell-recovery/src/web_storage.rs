//! Web Storage
//!
//! `localStorage` and `sessionStorage` for one origin.
//!
//! - `localStorage`: survives page loads through `to_json` / `from_json`
//! - `sessionStorage`: lives as long as the page session
//! - Quota: 5 MB per store (keys + values combined)

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::str::FromStr;
use spin::RwLock;

// ── Constants ───────────────────────────────────────────────

/// Default maximum storage per store (5 MB).
pub const DEFAULT_QUOTA: usize = 5 * 1024 * 1024;

// ── Types ───────────────────────────────────────────────────

/// Storage handle shared between the page and its modules.
pub type SharedStorage = Arc<RwLock<WebStorage>>;

/// Storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Persistent, survives page loads.
    Local,
    /// Ephemeral, cleared when the session ends.
    Session,
}

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Key + value would exceed the quota.
    QuotaExceeded,
    /// Persisted snapshot could not be read.
    Corrupt(String),
    /// Only `localStorage` is written to a snapshot.
    NotPersistent,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::QuotaExceeded => write!(f, "QuotaExceededError"),
            StorageError::Corrupt(msg) => write!(f, "corrupt storage snapshot: {}", msg),
            StorageError::NotPersistent => write!(f, "sessionStorage is not persisted"),
        }
    }
}

/// A string key/value store.
#[derive(Debug, Clone)]
pub struct WebStorage {
    /// Key → Value store.
    data: BTreeMap<String, String>,
    /// Local or Session.
    storage_type: StorageType,
    /// Current total size (keys + values in bytes).
    current_size: usize,
    /// Byte capacity.
    quota: usize,
}

// ── Implementation ──────────────────────────────────────────

impl WebStorage {
    /// Create a new empty storage.
    pub fn new(storage_type: StorageType) -> Self {
        Self::with_quota(storage_type, DEFAULT_QUOTA)
    }

    /// Create a new empty storage with an explicit quota.
    pub fn with_quota(storage_type: StorageType, quota: usize) -> Self {
        Self {
            data: BTreeMap::new(),
            storage_type,
            current_size: 0,
            quota,
        }
    }

    /// Empty `localStorage`.
    pub fn local() -> Self {
        Self::new(StorageType::Local)
    }

    /// Empty `sessionStorage`.
    pub fn session() -> Self {
        Self::new(StorageType::Session)
    }

    /// Wrap into a shareable handle.
    pub fn shared(self) -> SharedStorage {
        Arc::new(RwLock::new(self))
    }

    /// Get an item by key.
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    /// Get an item and parse it. Missing and unparsable values are both `None`.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get_item(key)?.trim().parse().ok()
    }

    /// Set an item.  Returns `QuotaExceeded` if the quota would be exceeded.
    pub fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let new_entry_size = key.len() + value.len();

        let old_entry_size = self
            .data
            .get(key)
            .map(|v| key.len() + v.len())
            .unwrap_or(0);
        let projected = self.current_size - old_entry_size + new_entry_size;

        if projected > self.quota {
            return Err(StorageError::QuotaExceeded);
        }

        self.data.insert(String::from(key), String::from(value));
        self.current_size = projected;

        Ok(())
    }

    /// Remove an item.
    pub fn remove_item(&mut self, key: &str) {
        if let Some(value) = self.data.remove(key) {
            self.current_size = self
                .current_size
                .saturating_sub(key.len() + value.len());
        }
    }

    /// Clear all items.
    pub fn clear(&mut self) {
        self.data.clear();
        self.current_size = 0;
    }

    /// Number of items.
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Current byte usage.
    pub fn size(&self) -> usize {
        self.current_size
    }

    // ── Persistence (localStorage only) ─────────────────────

    /// Serialize to a JSON object of strings. Session storage never
    /// outlives its page and refuses.
    pub fn to_json(&self) -> Result<String, StorageError> {
        if self.storage_type == StorageType::Session {
            return Err(StorageError::NotPersistent);
        }
        serde_json::to_string(&self.data).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    /// Restore a `localStorage` snapshot written by [`WebStorage::to_json`].
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let data: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let current_size = data.iter().map(|(k, v)| k.len() + v.len()).sum();
        Ok(Self {
            data,
            storage_type: StorageType::Local,
            current_size,
            quota: DEFAULT_QUOTA,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────
