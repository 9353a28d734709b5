//! Offline Shell Worker
//!
//! Worker-context half of the offline shell: intercepts same-origin GET
//! requests, mirrors successful responses into a runtime cache and falls back
//! to cached copies (ending at the app shell) when the network is gone.
//!
//! # Architecture
//!
//! - `generation`: versioned precache/runtime cache names
//! - `cache`: generational cache store shared between worker versions and the page
//! - `request`: request/response model and URL key normalization
//! - `network`: network seam (`Network` trait) plus a scripted implementation
//! - `lifecycle`: worker state machine (`parsed → … → activated → redundant`)
//! - `fallback`: ordered cache lookup chains for offline requests
//! - `fetch`: request classification and network-first routing
//! - `push` / `clients`: push notifications and window clients
//! - `registration`: page-side registration container
//! - `worker`: the `OfflineWorker` tying it together behind one dispatch entry point

#![no_std]

extern crate alloc;

pub mod cache;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod generation;
pub mod lifecycle;
pub mod network;
pub mod push;
pub mod registration;
pub mod request;
pub mod worker;

pub use cache::{CacheError, CacheStorage, CachedResponse, SharedCacheStorage};
pub use clients::{ClientId, ClientInfo, Clients, SharedClients};
pub use clock::{Clock, ManualClock};
pub use config::{NotificationDefaults, WorkerConfig};
pub use error::WorkerError;
pub use fallback::{FallbackChain, FallbackHit, KeySource, LookupStep};
pub use fetch::{FetchOutcome, FetchRouter, FetchSource, RequestClass};
pub use generation::{CacheNames, CacheRole};
pub use lifecycle::{Lifecycle, LifecycleEvent, ServiceWorkerState};
pub use network::{Network, NetworkError, ScriptedNetwork};
pub use push::{Notification, NotificationTray, PushPayload};
pub use registration::{
    RegistrationId, Scope, ServiceWorkerContainer, ServiceWorkerRegistration, SharedContainer,
};
pub use request::{Request, RequestMethod, RequestMode, Response, UrlParts};
pub use worker::{
    ActivateReport, ClickOutcome, EventOutcome, InstallReport, OfflineWorker, WorkerEvent,
};
