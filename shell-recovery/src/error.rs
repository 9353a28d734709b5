//! Recovery error types.

use alloc::string::String;
use core::fmt;

use crate::web_storage::StorageError;

/// Errors raised by the recovery module
#[derive(Debug, Clone)]
pub enum RecoveryError {
    /// Web storage rejected a read or write
    Storage(StorageError),
    /// The browser refused an unregister or cache purge
    Platform(String),
    /// Configuration rejected during validation or parsing
    InvalidConfig(String),
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryError::Storage(e) => write!(f, "storage error: {}", e),
            RecoveryError::Platform(msg) => write!(f, "platform error: {}", msg),
            RecoveryError::InvalidConfig(msg) => write!(f, "invalid recovery config: {}", msg),
        }
    }
}

impl From<StorageError> for RecoveryError {
    fn from(e: StorageError) -> Self {
        RecoveryError::Storage(e)
    }
}

impl From<serde_json::Error> for RecoveryError {
    fn from(e: serde_json::Error) -> Self {
        RecoveryError::InvalidConfig(alloc::format!("{}", e))
    }
}
