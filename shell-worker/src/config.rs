//! Worker configuration.
//!
//! Defaults mirror the deployed app shell. A host can override any field by
//! loading JSON; absent fields keep their defaults.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use serde::Deserialize;

use crate::error::WorkerError;

/// Default cache name prefix.
pub const DEFAULT_CACHE_PREFIX: &str = "offline-shell";

/// Default cache version. Bump whenever the shell manifest changes.
pub const DEFAULT_CACHE_VERSION: &str = "v1";

/// Worker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin the worker controls, e.g. `https://app.example`
    pub origin: String,
    /// Prefix shared by every generation name
    pub cache_prefix: String,
    /// Version suffix of the current generations
    pub version: String,
    /// App-shell assets fetched at install time
    pub precache_manifest: Vec<String>,
    /// Shell keys tried, in order, when a navigation misses both caches
    pub shell_fallbacks: Vec<String>,
    /// Activate as soon as installed instead of waiting for the previous
    /// version to stop controlling pages
    pub skip_waiting: bool,
    /// Defaults for push notifications
    pub notification: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            version: DEFAULT_CACHE_VERSION.to_string(),
            precache_manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/manifest-kitchen.json".to_string(),
                "/sounds/notification.mp3".to_string(),
                "/icons/icon-192.png".to_string(),
                "/icons/icon-512.png".to_string(),
            ],
            shell_fallbacks: vec!["/index.html".to_string(), "/".to_string()],
            skip_waiting: true,
            notification: NotificationDefaults::default(),
        }
    }
}

impl WorkerConfig {
    /// Default configuration for `origin`
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, WorkerError> {
        let config: WorkerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the worker cannot run with
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.cache_prefix.is_empty() {
            return Err(WorkerError::InvalidConfig("empty cache prefix".to_string()));
        }
        if self.version.is_empty() {
            return Err(WorkerError::InvalidConfig("empty cache version".to_string()));
        }
        if self.origin.is_empty() || !self.origin.contains("://") {
            return Err(WorkerError::InvalidConfig(alloc::format!(
                "origin must be absolute, got {:?}",
                self.origin
            )));
        }
        if let Some(bad) = self
            .precache_manifest
            .iter()
            .chain(self.shell_fallbacks.iter())
            .find(|url| !url.starts_with('/'))
        {
            return Err(WorkerError::InvalidConfig(alloc::format!(
                "shell assets must be origin-relative, got {:?}",
                bad
            )));
        }
        Ok(())
    }
}

/// Values used when a push payload leaves a field out
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub icon: String,
    pub badge: String,
    pub sound: String,
    /// Page opened when the notification is clicked
    pub url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "New notification".to_string(),
            body: String::new(),
            tag: "general".to_string(),
            icon: "/icons/icon-192.png".to_string(),
            badge: "/icons/icon-192.png".to_string(),
            sound: "/sounds/notification.mp3".to_string(),
            url: "/".to_string(),
        }
    }
}
