//! Worker Registrations
//!
//! Page-side container of the worker registrations for one origin. Each
//! scope has an active worker and at most one installed worker waiting to
//! replace it. The recovery path uses the container to unregister
//! everything before a forced reload.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use spin::RwLock;

use crate::error::WorkerError;
use crate::lifecycle::ServiceWorkerState;
use crate::request::UrlParts;
use crate::worker::OfflineWorker;

/// Container handle shared between the page and the host
pub type SharedContainer = Arc<RwLock<ServiceWorkerContainer>>;

/// Registration ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    /// Get raw value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Registration scope: an origin-relative path ending in `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(String);

impl Scope {
    /// Create a new scope
    pub fn new(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self(path)
    }

    /// Default scope for a script: its directory
    pub fn for_script(script_url: &str) -> Self {
        let path = UrlParts::parse(script_url).path;
        match path.rfind('/') {
            Some(pos) => Self::new(&path[..=pos]),
            None => Self::new("/"),
        }
    }

    /// Get the path
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Check if a URL is within this scope
    pub fn contains(&self, url: &str) -> bool {
        UrlParts::parse(url).path.starts_with(&self.0)
    }
}

/// A scope's registration: the worker controlling pages and the next
/// version waiting to take over
pub struct ServiceWorkerRegistration {
    id: RegistrationId,
    scope: Scope,
    script_url: String,
    active: Option<Arc<OfflineWorker>>,
    waiting: Option<Arc<OfflineWorker>>,
}

impl ServiceWorkerRegistration {
    /// Registration ID
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// The scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The script URL
    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// The active worker
    pub fn active(&self) -> Option<&Arc<OfflineWorker>> {
        self.active.as_ref()
    }

    /// The installed worker waiting to activate
    pub fn waiting(&self) -> Option<&Arc<OfflineWorker>> {
        self.waiting.as_ref()
    }

    /// Put an installed worker in the waiting slot; a worker already
    /// waiting there is discarded
    fn set_waiting(&mut self, worker: Arc<OfflineWorker>) {
        if let Some(previous) = self.waiting.replace(worker) {
            log::info!("[SW] waiting worker for {} replaced", self.scope.path());
            previous.retire();
        }
    }

    /// Activate the waiting worker if it may take over. Returns whether it did.
    fn promote(&mut self) -> Result<bool, WorkerError> {
        let Some(waiting) = self.waiting.as_ref() else {
            return Ok(false);
        };
        let free = self.active.as_ref().map_or(true, |active| !active.controls_clients());
        if free && waiting.is_waiting() {
            waiting.release_waiting()?;
        }
        if !waiting.can_activate() {
            log::debug!(
                "[SW] {:?} waits for the active worker of {}",
                waiting,
                self.scope.path()
            );
            return Ok(false);
        }

        let Some(next) = self.waiting.take() else {
            return Ok(false);
        };
        if let Some(previous) = self.active.take() {
            previous.retire();
        }
        next.activate()?;
        self.active = Some(next);
        Ok(true)
    }

    fn retire_all(&mut self) {
        for worker in self.active.take().into_iter().chain(self.waiting.take()) {
            worker.retire();
        }
    }
}

impl core::fmt::Debug for ServiceWorkerRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceWorkerRegistration")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("script_url", &self.script_url)
            .field("active", &self.active)
            .field("waiting", &self.waiting)
            .finish()
    }
}

/// Service Worker Container
///
/// Manages all registrations for an origin.
#[derive(Debug)]
pub struct ServiceWorkerContainer {
    origin: String,
    next_id: u64,
    registrations: BTreeMap<Scope, ServiceWorkerRegistration>,
}

impl ServiceWorkerContainer {
    /// Create a new container
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            next_id: 1,
            registrations: BTreeMap::new(),
        }
    }

    /// Wrap into a shareable handle
    pub fn shared(self) -> SharedContainer {
        Arc::new(RwLock::new(self))
    }

    /// Get the origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Register `worker` for `scope` (or the script's directory).
    ///
    /// A parsed worker is installed first; if that fails the scope keeps
    /// whatever it had. The installed worker then takes the waiting slot
    /// and activates right away when it skips waiting or when the current
    /// worker controls no page. Otherwise it stays waiting until
    /// [`ServiceWorkerContainer::promote_waiting`] lets it in.
    pub fn register(
        &mut self,
        script_url: &str,
        scope: Option<&str>,
        worker: Arc<OfflineWorker>,
    ) -> Result<RegistrationId, WorkerError> {
        let scope = match scope {
            Some(s) => Scope::new(s),
            None => Scope::for_script(script_url),
        };

        match worker.state() {
            ServiceWorkerState::Parsed => {
                worker.install()?;
            }
            ServiceWorkerState::Installed => {}
            state => {
                return Err(WorkerError::InvalidStateTransition {
                    from: state,
                    to: ServiceWorkerState::Installed,
                })
            }
        }

        let next_id = &mut self.next_id;
        let registration = self.registrations.entry(scope.clone()).or_insert_with(|| {
            let id = RegistrationId(*next_id);
            *next_id += 1;
            log::info!("[SW] registered {} for scope {}", script_url, scope.path());
            ServiceWorkerRegistration {
                id,
                scope,
                script_url: String::new(),
                active: None,
                waiting: None,
            }
        });
        registration.script_url = script_url.to_string();
        registration.set_waiting(worker);
        registration.promote()?;
        Ok(registration.id)
    }

    /// Let the waiting worker of `scope` in once the active one no longer
    /// controls pages. Returns whether it activated.
    pub fn promote_waiting(&mut self, scope: &Scope) -> Result<bool, WorkerError> {
        self.registrations
            .get_mut(scope)
            .ok_or(WorkerError::RegistrationNotFound)?
            .promote()
    }

    /// Get registration for a scope
    pub fn get_registration(&self, scope: &Scope) -> Option<&ServiceWorkerRegistration> {
        self.registrations.get(scope)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Unregister a scope. Its workers become redundant.
    pub fn unregister(&mut self, scope: &Scope) -> Result<(), WorkerError> {
        let mut registration = self
            .registrations
            .remove(scope)
            .ok_or(WorkerError::RegistrationNotFound)?;
        registration.retire_all();
        log::info!("[SW] unregistered scope {}", scope.path());
        Ok(())
    }

    /// Unregister every scope. Returns how many were removed.
    pub fn unregister_all(&mut self) -> usize {
        let registrations = core::mem::take(&mut self.registrations);
        let removed = registrations.len();
        for mut registration in registrations.into_values() {
            registration.retire_all();
        }
        if removed > 0 {
            log::info!("[SW] unregistered {} registration(s)", removed);
        }
        removed
    }

    /// Find matching registration for a URL: the longest containing scope
    pub fn match_registration(&self, url: &str) -> Option<&ServiceWorkerRegistration> {
        self.registrations
            .iter()
            .filter(|(scope, _)| scope.contains(url))
            .max_by_key(|(scope, _)| scope.path().len())
            .map(|(_, reg)| reg)
    }

    /// Active worker controlling `url`, if any
    pub fn controller(&self, url: &str) -> Option<Arc<OfflineWorker>> {
        self.match_registration(url)
            .and_then(|registration| registration.active())
            .cloned()
    }
}
