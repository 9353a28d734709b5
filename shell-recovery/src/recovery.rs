//! Recovery Routine
//!
//! A chunk-load failure runs the routine at most once per document load:
//!
//! 1. bail out if this load already recovered
//! 2. consult the cooldown record and record the attempt
//! 3. set the session flag
//! 4. unregister every worker registration
//! 5. delete every cache generation
//! 6. replace the location with a cache-busted URL
//!
//! Once step 3 has committed the reload always happens, whatever steps 4
//! and 5 report.
//!
//! The flag lives in session storage and is dropped by
//! [`RecoveryModule::on_page_load`], so a failure that comes back right
//! after the forced reload meets the cooldown record instead of the flag.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use shell_worker::Clock;

use crate::config::RecoveryConfig;
use crate::detector::{ChunkErrorDetector, ErrorSignal};
use crate::error::RecoveryError;
use crate::limiter::{Admission, RecoveryLimiter, RecoveryState};
use crate::platform::RecoveryPlatform;
use crate::web_storage::SharedStorage;

/// What an error report led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Not a chunk-load failure
    Ignored,
    /// This session already recovered once
    AlreadyAttempted,
    /// Too many recoveries inside the cooldown window
    CoolingDown { retry_after_ms: u64 },
    /// Caches and workers dropped (where possible) and the page reloaded
    Reloaded {
        url: String,
        attempt: u32,
        /// Registrations removed, `None` if unregistering failed
        unregistered: Option<usize>,
        /// Generations deleted, `None` if the purge failed
        purged: Option<usize>,
    },
}

/// Result of the development-mode purge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevCleanup {
    /// Not a development build
    Disabled,
    /// Already ran in this session
    AlreadyDone,
    /// Ran now
    Cleaned {
        unregistered: Option<usize>,
        purged: Option<usize>,
    },
}

/// Replaces the location when dropped, so the reload survives any early
/// exit from the cleanup steps.
struct ForcedReload<'a> {
    platform: &'a dyn RecoveryPlatform,
    url: String,
}

impl Drop for ForcedReload<'_> {
    fn drop(&mut self) {
        log::info!("[Recovery] reloading {}", self.url);
        self.platform.replace_location(&self.url);
    }
}

/// Page-side recovery module
pub struct RecoveryModule {
    config: RecoveryConfig,
    detector: ChunkErrorDetector,
    limiter: RecoveryLimiter,
    local: SharedStorage,
    session: SharedStorage,
    clock: Arc<dyn Clock>,
    platform: Arc<dyn RecoveryPlatform>,
}

impl RecoveryModule {
    /// Create the module for one page session
    pub fn new(
        config: RecoveryConfig,
        local: SharedStorage,
        session: SharedStorage,
        clock: Arc<dyn Clock>,
        platform: Arc<dyn RecoveryPlatform>,
    ) -> Result<Self, RecoveryError> {
        config.validate()?;
        Ok(Self {
            detector: ChunkErrorDetector::from_config(&config),
            limiter: RecoveryLimiter::from_config(&config),
            config,
            local,
            session,
            clock,
            platform,
        })
    }

    /// Configuration
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Persisted cooldown record
    pub fn state(&self) -> RecoveryState {
        self.limiter.load(&self.local.read())
    }

    /// Whether this document load already recovered
    pub fn attempted_this_session(&self) -> bool {
        self.session
            .read()
            .get_item(&self.config.keys.session_attempted)
            .is_some()
    }

    /// Page start-up hook: a fresh document load clears the attempted flag,
    /// then the development purge runs when enabled
    pub fn on_page_load(&self) -> DevCleanup {
        self.session
            .write()
            .remove_item(&self.config.keys.session_attempted);
        self.dev_cleanup()
    }

    /// Window error or unhandled rejection reported by the page
    pub fn handle_error(&self, signal: &ErrorSignal) -> RecoveryOutcome {
        if !self.detector.matches(signal) {
            return RecoveryOutcome::Ignored;
        }
        log::warn!("[Recovery] chunk load failure: {}", signal.text());
        self.recover()
    }

    /// Run the recovery routine
    pub fn recover(&self) -> RecoveryOutcome {
        let attempt = {
            let mut session = self.session.write();
            if session.get_item(&self.config.keys.session_attempted).is_some() {
                log::debug!("[Recovery] already attempted this session");
                return RecoveryOutcome::AlreadyAttempted;
            }

            let now = self.clock.now_ms();
            let attempt = {
                let mut local = self.local.write();
                let state = self.limiter.load(&local);
                match self.limiter.check(&state, now) {
                    Admission::CoolingDown { retry_after_ms } => {
                        log::warn!(
                            "[Recovery] giving up, {} attempts inside the cooldown window",
                            state.count_in_window
                        );
                        return RecoveryOutcome::CoolingDown { retry_after_ms };
                    }
                    Admission::Allowed { attempt } => {
                        let record = RecoveryState {
                            last_attempt_at: Some(now),
                            count_in_window: attempt,
                        };
                        if let Err(e) = self.limiter.store(&mut local, &record) {
                            log::warn!("[Recovery] could not record attempt: {}", e);
                        }
                        attempt
                    }
                }
            };

            if let Err(e) = session.set_item(&self.config.keys.session_attempted, "1") {
                log::warn!("[Recovery] could not set session flag: {}", e);
            }
            attempt
        };

        let url = cache_busted_url(
            &self.platform.current_url(),
            &self.config.cache_bust_param,
            self.clock.now_ms(),
        );
        let reload = ForcedReload {
            platform: self.platform.as_ref(),
            url: url.clone(),
        };
        let (unregistered, purged) = self.unregister_and_purge();
        drop(reload);

        RecoveryOutcome::Reloaded {
            url,
            attempt,
            unregistered,
            purged,
        }
    }

    /// Proactive purge for development builds, once per session, no reload
    pub fn dev_cleanup(&self) -> DevCleanup {
        if !self.config.dev_mode {
            return DevCleanup::Disabled;
        }
        {
            let mut session = self.session.write();
            if session.get_item(&self.config.keys.dev_cleanup_done).is_some() {
                return DevCleanup::AlreadyDone;
            }
            if let Err(e) = session.set_item(&self.config.keys.dev_cleanup_done, "1") {
                log::warn!("[Recovery] could not set dev cleanup flag: {}", e);
            }
        }
        log::info!("[Recovery] development build, dropping workers and caches");
        let (unregistered, purged) = self.unregister_and_purge();
        DevCleanup::Cleaned {
            unregistered,
            purged,
        }
    }

    fn unregister_and_purge(&self) -> (Option<usize>, Option<usize>) {
        let unregistered = match self.platform.unregister_all() {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("[Recovery] unregister failed: {}", e);
                None
            }
        };
        let purged = match self.platform.purge_caches() {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("[Recovery] cache purge failed: {}", e);
                None
            }
        };
        (unregistered, purged)
    }
}

/// `url` with `param=timestamp` in its query. An existing `param` is
/// replaced and the fragment is kept.
pub fn cache_busted_url(url: &str, param: &str, timestamp: u64) -> String {
    let (rest, fragment) = match url.find('#') {
        Some(pos) => (&url[..pos], &url[pos..]),
        None => (url, ""),
    };
    let (base, query) = match rest.find('?') {
        Some(pos) => (&rest[..pos], &rest[pos + 1..]),
        None => (rest, ""),
    };

    let stamp = format!("{}={}", param, timestamp);
    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(param))
        .collect();
    pairs.push(&stamp);

    format!("{}?{}{}", base, pairs.join("&"), fragment)
}
