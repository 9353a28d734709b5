//! Stale-Asset Recovery
//!
//! Page-side half of the offline shell. When the page fails to load one of
//! its code chunks, the usual cause is a worker or cache still serving
//! assets from an older deployment. This crate recognises those failures and
//! heals the page once: unregister every worker, purge every cache and
//! reload with a cache-busting query parameter.
//!
//! # Architecture
//!
//! - `detector`: chunk-load error patterns and the error signals the page reports
//! - `web_storage`: `localStorage` / `sessionStorage` model with JSON persistence
//! - `limiter`: cooldown record guarding against reload loops
//! - `platform`: seam to the browser (registrations, caches, location)
//! - `recovery`: the recovery routine and the development-mode cleanup

#![no_std]

extern crate alloc;

pub mod config;
pub mod detector;
pub mod error;
pub mod limiter;
pub mod platform;
pub mod recovery;
pub mod web_storage;

pub use config::{RecoveryConfig, StorageKeys};
pub use detector::{ChunkErrorDetector, ErrorSignal};
pub use error::RecoveryError;
pub use limiter::{Admission, RecoveryLimiter, RecoveryState};
pub use platform::{BrowserPage, RecoveryPlatform};
pub use recovery::{cache_busted_url, DevCleanup, RecoveryModule, RecoveryOutcome};
pub use web_storage::{SharedStorage, StorageError, StorageType, WebStorage};
