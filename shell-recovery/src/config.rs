//! Recovery configuration.
//!
//! The cooldown numbers were tuned against mobile browsers that re-throw the
//! same chunk error right after a reload; hosts may override them from JSON.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::Deserialize;

use crate::error::RecoveryError;

/// Default cooldown window (30 s).
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;

/// Default number of recoveries allowed inside one window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default cache-busting query parameter.
pub const DEFAULT_CACHE_BUST_PARAM: &str = "_reload";

/// Message fragments that identify a failed module or chunk load.
pub const DEFAULT_CHUNK_ERROR_PATTERNS: &[&str] = &[
    "failed to fetch dynamically imported module",
    "error loading dynamically imported module",
    "importing a module script failed",
    "module script failed",
    "loading chunk * failed",
    "loading css chunk * failed",
    "chunkloaderror",
];

/// Recovery module configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Cooldown window measured from the last attempt
    pub cooldown_ms: u64,
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Case-insensitive patterns; `*` matches any run of characters
    pub chunk_error_patterns: Vec<String>,
    /// Query parameter carrying the reload timestamp
    pub cache_bust_param: String,
    /// Run the proactive purge once per session
    pub dev_mode: bool,
    /// Storage key names
    pub keys: StorageKeys,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            chunk_error_patterns: DEFAULT_CHUNK_ERROR_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_string(),
            dev_mode: cfg!(debug_assertions),
            keys: StorageKeys::default(),
        }
    }
}

impl RecoveryConfig {
    /// Production defaults: no proactive purge
    pub fn production() -> Self {
        Self {
            dev_mode: false,
            ..Self::default()
        }
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, RecoveryError> {
        let config: RecoveryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would disable the loop guard or the reload
    pub fn validate(&self) -> Result<(), RecoveryError> {
        if self.cooldown_ms == 0 {
            return Err(RecoveryError::InvalidConfig(
                "cooldown_ms must be positive".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(RecoveryError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let reserved = |c: char| matches!(c, '&' | '=' | '#' | '?');
        if self.cache_bust_param.is_empty() || self.cache_bust_param.contains(reserved) {
            return Err(RecoveryError::InvalidConfig(alloc::format!(
                "bad cache-bust parameter {:?}",
                self.cache_bust_param
            )));
        }
        // a pattern of wildcards alone would never be matched
        if let Some(bad) = self
            .chunk_error_patterns
            .iter()
            .find(|p| p.split('*').all(|piece| piece.trim().is_empty()))
        {
            return Err(RecoveryError::InvalidConfig(alloc::format!(
                "empty chunk error pattern {:?}",
                bad
            )));
        }
        Ok(())
    }
}

/// Keys used in local and session storage
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Local: timestamp (ms) of the last recovery
    pub last_attempt: String,
    /// Local: recoveries inside the current window
    pub attempt_count: String,
    /// Session: recovery already ran in this session
    pub session_attempted: String,
    /// Session: development purge already ran in this session
    pub dev_cleanup_done: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            last_attempt: "offline-shell:recovery:last-attempt".to_string(),
            attempt_count: "offline-shell:recovery:count".to_string(),
            session_attempted: "offline-shell:recovery:attempted".to_string(),
            dev_cleanup_done: "offline-shell:dev-cleanup:done".to_string(),
        }
    }
}
