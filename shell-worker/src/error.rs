//! Worker error types.

use alloc::string::String;
use core::fmt;

use crate::cache::CacheError;
use crate::lifecycle::ServiceWorkerState;

/// Errors raised by the offline worker and its page-side container.
#[derive(Debug, Clone)]
pub enum WorkerError {
    /// State transition not allowed by the lifecycle table
    InvalidStateTransition {
        from: ServiceWorkerState,
        to: ServiceWorkerState,
    },
    /// A precache manifest entry could not be fetched; the worker is redundant
    InstallFailed { url: String, reason: String },
    /// Cache store failure
    Cache(CacheError),
    /// Configuration rejected during validation or parsing
    InvalidConfig(String),
    /// Unknown notification id
    NotificationNotFound(u64),
    /// Unknown window client id
    ClientNotFound(u64),
    /// No registration for the scope
    RegistrationNotFound,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::InvalidStateTransition { from, to } => {
                write!(f, "invalid worker transition {:?} -> {:?}", from, to)
            }
            WorkerError::InstallFailed { url, reason } => {
                write!(f, "install failed fetching {}: {}", url, reason)
            }
            WorkerError::Cache(e) => write!(f, "cache error: {}", e),
            WorkerError::InvalidConfig(msg) => write!(f, "invalid worker config: {}", msg),
            WorkerError::NotificationNotFound(id) => write!(f, "notification {} not found", id),
            WorkerError::ClientNotFound(id) => write!(f, "client {} not found", id),
            WorkerError::RegistrationNotFound => write!(f, "worker registration not found"),
        }
    }
}

impl From<CacheError> for WorkerError {
    fn from(e: CacheError) -> Self {
        WorkerError::Cache(e)
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(e: serde_json::Error) -> Self {
        WorkerError::InvalidConfig(alloc::format!("{}", e))
    }
}
