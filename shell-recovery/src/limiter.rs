//! Recovery Cooldown
//!
//! Guards against reload loops across page loads. The state is two strings
//! in local storage: the timestamp of the last attempt and the number of
//! attempts inside the current window. Missing or corrupt values count as
//! no previous attempt.

use crate::config::RecoveryConfig;
use crate::error::RecoveryError;
use crate::web_storage::WebStorage;
use alloc::string::{String, ToString};

/// Persisted cooldown record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryState {
    /// Timestamp (ms) of the last attempt
    pub last_attempt_at: Option<u64>,
    /// Attempts inside the window that started at the first of them
    pub count_in_window: u32,
}

/// Limiter verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Proceed; this is attempt number `attempt` inside the window
    Allowed { attempt: u32 },
    /// Cap reached; try again in `retry_after_ms`
    CoolingDown { retry_after_ms: u64 },
}

/// Cooldown limiter over local storage
#[derive(Debug, Clone)]
pub struct RecoveryLimiter {
    cooldown_ms: u64,
    max_attempts: u32,
    last_attempt_key: String,
    count_key: String,
}

impl RecoveryLimiter {
    /// Create a limiter
    pub fn new(
        cooldown_ms: u64,
        max_attempts: u32,
        last_attempt_key: &str,
        count_key: &str,
    ) -> Self {
        Self {
            cooldown_ms,
            max_attempts,
            last_attempt_key: last_attempt_key.to_string(),
            count_key: count_key.to_string(),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(
            config.cooldown_ms,
            config.max_attempts,
            &config.keys.last_attempt,
            &config.keys.attempt_count,
        )
    }

    /// Read the record
    pub fn load(&self, storage: &WebStorage) -> RecoveryState {
        match storage.get_parsed::<u64>(&self.last_attempt_key) {
            Some(at) => RecoveryState {
                last_attempt_at: Some(at),
                count_in_window: storage.get_parsed(&self.count_key).unwrap_or(0),
            },
            None => RecoveryState::default(),
        }
    }

    /// Decide without touching storage
    pub fn check(&self, state: &RecoveryState, now: u64) -> Admission {
        match state.last_attempt_at {
            Some(last) if self.in_window(last, now) => {
                if state.count_in_window >= self.max_attempts {
                    let elapsed = now.saturating_sub(last);
                    Admission::CoolingDown {
                        retry_after_ms: self.cooldown_ms - elapsed,
                    }
                } else {
                    Admission::Allowed {
                        attempt: state.count_in_window + 1,
                    }
                }
            }
            _ => Admission::Allowed { attempt: 1 },
        }
    }

    /// Check and, when allowed, record the attempt at `now`
    pub fn try_acquire(
        &self,
        storage: &mut WebStorage,
        now: u64,
    ) -> Result<Admission, RecoveryError> {
        let state = self.load(storage);
        let admission = self.check(&state, now);
        if let Admission::Allowed { attempt } = admission {
            self.store(
                storage,
                &RecoveryState {
                    last_attempt_at: Some(now),
                    count_in_window: attempt,
                },
            )?;
        }
        Ok(admission)
    }

    /// Write the record
    pub fn store(&self, storage: &mut WebStorage, state: &RecoveryState) -> Result<(), RecoveryError> {
        match state.last_attempt_at {
            Some(at) => {
                storage.set_item(&self.last_attempt_key, &at.to_string())?;
                storage.set_item(&self.count_key, &state.count_in_window.to_string())?;
            }
            None => {
                storage.remove_item(&self.last_attempt_key);
                storage.remove_item(&self.count_key);
            }
        }
        Ok(())
    }

    fn in_window(&self, last: u64, now: u64) -> bool {
        now.saturating_sub(last) < self.cooldown_ms
    }
}
