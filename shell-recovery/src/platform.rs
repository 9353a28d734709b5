//! Browser Seam
//!
//! The three things recovery needs from the browser: drop every worker
//! registration, drop every cache, replace the current location.

use alloc::string::String;
use alloc::vec::Vec;
use spin::Mutex;

use shell_worker::{SharedCacheStorage, SharedContainer};

use crate::error::RecoveryError;

/// What the recovery routine asks of the page's browser
pub trait RecoveryPlatform: Send + Sync {
    /// Unregister every worker registration of the origin
    fn unregister_all(&self) -> Result<usize, RecoveryError>;
    /// Delete every cache generation of the origin
    fn purge_caches(&self) -> Result<usize, RecoveryError>;
    /// Current document URL
    fn current_url(&self) -> String;
    /// Navigate to `url` without adding a history entry
    fn replace_location(&self, url: &str);
}

/// In-memory page over the worker container and cache storage
pub struct BrowserPage {
    container: SharedContainer,
    caches: SharedCacheStorage,
    location: Mutex<String>,
    replaced: Mutex<Vec<String>>,
}

impl BrowserPage {
    /// Page at `url`
    pub fn new(url: &str, container: SharedContainer, caches: SharedCacheStorage) -> Self {
        Self {
            container,
            caches,
            location: Mutex::new(String::from(url)),
            replaced: Mutex::new(Vec::new()),
        }
    }

    /// Every `replace_location` target, oldest first
    pub fn replaced_locations(&self) -> Vec<String> {
        self.replaced.lock().clone()
    }

    /// Number of forced reloads so far
    pub fn reload_count(&self) -> usize {
        self.replaced.lock().len()
    }

    /// Registration container
    pub fn container(&self) -> &SharedContainer {
        &self.container
    }

    /// Cache storage
    pub fn caches(&self) -> &SharedCacheStorage {
        &self.caches
    }
}

impl RecoveryPlatform for BrowserPage {
    fn unregister_all(&self) -> Result<usize, RecoveryError> {
        Ok(self.container.write().unregister_all())
    }

    fn purge_caches(&self) -> Result<usize, RecoveryError> {
        Ok(self.caches.write().clear())
    }

    fn current_url(&self) -> String {
        self.location.lock().clone()
    }

    fn replace_location(&self, url: &str) {
        *self.location.lock() = String::from(url);
        self.replaced.lock().push(String::from(url));
    }
}
