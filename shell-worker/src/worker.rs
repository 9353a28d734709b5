//! Offline Worker
//!
//! One worker version: its lifecycle, its two cache generations and the
//! handlers for install, activate, fetch, push and notification clicks.
//! Handlers take `&self` so a host can run fetches concurrently; the
//! lifecycle and notification tray sit behind their own locks.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use crate::cache::SharedCacheStorage;
use crate::clients::{ClientInfo, SharedClients};
use crate::clock::Clock;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::fallback::FallbackChain;
use crate::fetch::{FetchOutcome, FetchRouter};
use crate::generation::CacheNames;
use crate::lifecycle::{Lifecycle, LifecycleEvent, ServiceWorkerState};
use crate::network::Network;
use crate::push::{Notification, NotificationTray, PushPayload};
use crate::request::{Request, Response};

/// Events a host delivers to the worker
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Push with its raw payload, if any
    Push(Option<Vec<u8>>),
    /// Click on the notification with this id
    NotificationClick(u64),
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Precache generation that was filled
    pub cache_name: String,
    /// Number of manifest entries stored
    pub cached: usize,
}

/// Result of a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Orphaned generations that were deleted
    pub deleted: Vec<String>,
    /// Windows that became controlled
    pub claimed: usize,
}

/// What a notification click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An open window already showed the target and was focused
    Focused(ClientInfo),
    /// A new window was opened at the target
    Opened(ClientInfo),
}

/// Typed result of [`OfflineWorker::dispatch`]
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
    Notified(Notification),
    Clicked(ClickOutcome),
}

/// A single worker version
pub struct OfflineWorker {
    config: WorkerConfig,
    names: CacheNames,
    caches: SharedCacheStorage,
    network: Arc<dyn Network>,
    clock: Arc<dyn Clock>,
    clients: SharedClients,
    router: FetchRouter,
    lifecycle: Mutex<Lifecycle>,
    notifications: Mutex<NotificationTray>,
}

impl core::fmt::Debug for OfflineWorker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OfflineWorker")
            .field("origin", &self.config.origin)
            .field("version", &self.config.version)
            .field("state", &self.state())
            .finish()
    }
}

impl OfflineWorker {
    /// Create a worker in the `Parsed` state
    pub fn new(
        config: WorkerConfig,
        caches: SharedCacheStorage,
        network: Arc<dyn Network>,
        clock: Arc<dyn Clock>,
        clients: SharedClients,
    ) -> Result<Self, WorkerError> {
        config.validate()?;
        let names = CacheNames::from_config(&config);
        let router = FetchRouter::new(
            &config.origin,
            names.clone(),
            FallbackChain::navigation(&config.shell_fallbacks),
            caches.clone(),
            network.clone(),
            clock.clone(),
        );
        Ok(Self {
            config,
            names,
            caches,
            network,
            clock,
            clients,
            router,
            lifecycle: Mutex::new(Lifecycle::new()),
            notifications: Mutex::new(NotificationTray::new()),
        })
    }

    /// Configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current generation names
    pub fn cache_names(&self) -> &CacheNames {
        &self.names
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceWorkerState {
        self.lifecycle.lock().state()
    }

    /// Installed but held back until the previous version lets go
    pub fn is_waiting(&self) -> bool {
        self.lifecycle.lock().is_waiting()
    }

    /// Whether this worker may activate now
    pub fn can_activate(&self) -> bool {
        self.lifecycle.lock().can_activate()
    }

    /// Stop waiting: the previous version no longer controls pages
    pub fn release_waiting(&self) -> Result<(), WorkerError> {
        self.lifecycle.lock().release()
    }

    /// Active and controlling at least one window
    pub fn controls_clients(&self) -> bool {
        self.state() == ServiceWorkerState::Activated
            && self.clients.read().match_all().iter().any(|c| c.controlled)
    }

    /// Take the lifecycle events recorded so far
    pub fn drain_events(&self) -> Vec<LifecycleEvent> {
        self.lifecycle.lock().drain_events()
    }

    /// Notifications currently shown
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().list().into_iter().cloned().collect()
    }

    /// Fetch the whole manifest and store it in the precache in one batch.
    ///
    /// Any failure leaves the precache untouched and the worker redundant.
    pub fn install(&self) -> Result<InstallReport, WorkerError> {
        self.lifecycle
            .lock()
            .transition(ServiceWorkerState::Installing)?;
        log::info!(
            "[SW] installing {} ({} assets)",
            self.names.precache(),
            self.config.precache_manifest.len()
        );

        let stored = self
            .fetch_manifest()
            .and_then(|entries| {
                let now = self.clock.now_ms();
                self.caches
                    .write()
                    .put_all(self.names.precache(), &entries, now)
                    .map(|()| entries.len())
                    .map_err(WorkerError::from)
            });

        let mut lifecycle = self.lifecycle.lock();
        match stored {
            Ok(cached) => {
                lifecycle.transition(ServiceWorkerState::Installed)?;
                if self.config.skip_waiting {
                    lifecycle.skip_waiting()?;
                }
                log::info!("[SW] installed, {} assets precached", cached);
                Ok(InstallReport {
                    cache_name: String::from(self.names.precache()),
                    cached,
                })
            }
            Err(e) => {
                log::warn!("[SW] install failed: {}", e);
                lifecycle.transition(ServiceWorkerState::Redundant)?;
                Err(e)
            }
        }
    }

    fn fetch_manifest(&self) -> Result<Vec<(String, Response)>, WorkerError> {
        self.config
            .precache_manifest
            .iter()
            .map(|url| {
                let response = self
                    .network
                    .fetch(&Request::get(url.as_str()))
                    .map_err(|e| WorkerError::InstallFailed {
                        url: url.clone(),
                        reason: alloc::format!("{}", e),
                    })?;
                if !response.is_cacheable() {
                    return Err(WorkerError::InstallFailed {
                        url: url.clone(),
                        reason: alloc::format!("status {}", response.status),
                    });
                }
                Ok((url.clone(), response))
            })
            .collect()
    }

    /// Delete orphaned generations, become active and claim every window
    pub fn activate(&self) -> Result<ActivateReport, WorkerError> {
        self.lifecycle
            .lock()
            .transition(ServiceWorkerState::Activating)?;

        let deleted = {
            let mut caches = self.caches.write();
            let names = caches.keys();
            let orphaned = self.names.orphaned(names.iter().map(String::as_str));
            for name in &orphaned {
                caches.delete(name);
                log::info!("[SW] deleted old cache {}", name);
            }
            orphaned
        };

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.transition(ServiceWorkerState::Activated)?;
        let claimed = self.clients.write().claim();
        lifecycle.claim(claimed)?;
        log::info!("[SW] activated, controlling {} new client(s)", claimed);

        Ok(ActivateReport { deleted, claimed })
    }

    /// Route one request. Only an active worker intercepts.
    pub fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if self.state() != ServiceWorkerState::Activated {
            return FetchOutcome::Passthrough;
        }
        self.router.handle(request)
    }

    /// Show a notification for a push
    pub fn handle_push(&self, data: Option<&[u8]>) -> Notification {
        let payload = PushPayload::parse(data);
        self.notifications
            .lock()
            .show(payload, &self.config.notification)
            .clone()
    }

    /// Close the notification, then focus a window showing its target or
    /// open a new one
    pub fn handle_notification_click(&self, id: u64) -> Result<ClickOutcome, WorkerError> {
        let notification = self.notifications.lock().close(id)?;
        let target = notification.target_url;

        let mut clients = self.clients.write();
        if let Some(existing) = clients.find_by_url(&target).map(|c| c.id) {
            let focused = clients.focus(existing)?.clone();
            return Ok(ClickOutcome::Focused(focused));
        }
        Ok(ClickOutcome::Opened(clients.open_window(&target)))
    }

    /// Single entry point for host events
    pub fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.install().map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetched(self.handle_fetch(&request))),
            WorkerEvent::Push(data) => Ok(EventOutcome::Notified(self.handle_push(data.as_deref()))),
            WorkerEvent::NotificationClick(id) => self
                .handle_notification_click(id)
                .map(EventOutcome::Clicked),
        }
    }

    /// Become redundant after being unregistered
    pub fn retire(&self) {
        let mut lifecycle = self.lifecycle.lock();
        let was_active = lifecycle.state() == ServiceWorkerState::Activated;
        match lifecycle.state() {
            ServiceWorkerState::Redundant => return,
            ServiceWorkerState::Parsed => {
                log::debug!("[SW] retiring a worker that never installed");
                return;
            }
            _ => {}
        }
        if let Err(e) = lifecycle.transition(ServiceWorkerState::Redundant) {
            log::warn!("[SW] retire: {}", e);
            return;
        }
        if was_active {
            self.clients.write().release();
        }
    }
}
