//! Worker Lifecycle
//!
//! Explicit state machine for one worker version. Every change goes through
//! [`Lifecycle::transition`], which checks the transition table and records
//! the events a host would observe.
//!
//! An installed worker waits until it either asked to skip waiting or was
//! released because the previous version stopped controlling pages.

use alloc::vec::Vec;

use crate::error::WorkerError;

/// Worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceWorkerState {
    /// Script evaluated, nothing run yet
    Parsed,
    /// Install handler running
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activate handler running
    Activating,
    /// Active and controlling pages
    Activated,
    /// Failed or replaced
    Redundant,
}

impl Default for ServiceWorkerState {
    fn default() -> Self {
        Self::Parsed
    }
}

/// Lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// State change
    StateChange {
        old_state: ServiceWorkerState,
        new_state: ServiceWorkerState,
    },
    /// Install event fired
    Install,
    /// Worker asked to skip the waiting phase
    SkipWaiting,
    /// Activate event fired
    Activate,
    /// Worker claimed the open clients
    ControllerChange { claimed: usize },
}

/// Lifecycle of a single worker version
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: ServiceWorkerState,
    skip_waiting: bool,
    released: bool,
    pending_events: Vec<LifecycleEvent>,
}

impl Lifecycle {
    /// Start in `Parsed`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ServiceWorkerState {
        self.state
    }

    /// Whether skip-waiting was requested
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Whether an installed worker may move on to `Activating`
    pub fn can_activate(&self) -> bool {
        self.skip_waiting || self.released
    }

    /// Installed and still held back
    pub fn is_waiting(&self) -> bool {
        self.state == ServiceWorkerState::Installed && !self.can_activate()
    }

    /// Events recorded so far
    pub fn pending_events(&self) -> &[LifecycleEvent] {
        &self.pending_events
    }

    /// Take the recorded events
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        core::mem::take(&mut self.pending_events)
    }

    /// Transition to `new_state`
    pub fn transition(&mut self, new_state: ServiceWorkerState) -> Result<(), WorkerError> {
        let old_state = self.state;

        let held = old_state == ServiceWorkerState::Installed
            && new_state == ServiceWorkerState::Activating
            && !self.can_activate();
        if held || !is_valid_transition(old_state, new_state) {
            return Err(WorkerError::InvalidStateTransition {
                from: old_state,
                to: new_state,
            });
        }

        self.state = new_state;
        log::debug!("[SW] state {:?} -> {:?}", old_state, new_state);

        self.pending_events.push(LifecycleEvent::StateChange {
            old_state,
            new_state,
        });

        match new_state {
            ServiceWorkerState::Installing => self.pending_events.push(LifecycleEvent::Install),
            ServiceWorkerState::Activating => self.pending_events.push(LifecycleEvent::Activate),
            _ => {}
        }

        Ok(())
    }

    /// Request activation without waiting for old clients to close
    pub fn skip_waiting(&mut self) -> Result<(), WorkerError> {
        match self.state {
            ServiceWorkerState::Installing | ServiceWorkerState::Installed => {
                self.skip_waiting = true;
                self.pending_events.push(LifecycleEvent::SkipWaiting);
                Ok(())
            }
            state => Err(WorkerError::InvalidStateTransition {
                from: state,
                to: ServiceWorkerState::Activating,
            }),
        }
    }

    /// The previous version no longer controls pages: stop waiting
    pub fn release(&mut self) -> Result<(), WorkerError> {
        match self.state {
            ServiceWorkerState::Installing | ServiceWorkerState::Installed => {
                self.released = true;
                Ok(())
            }
            state => Err(WorkerError::InvalidStateTransition {
                from: state,
                to: ServiceWorkerState::Activating,
            }),
        }
    }

    /// Record that `claimed` clients are now controlled
    pub fn claim(&mut self, claimed: usize) -> Result<(), WorkerError> {
        if self.state != ServiceWorkerState::Activated {
            return Err(WorkerError::InvalidStateTransition {
                from: self.state,
                to: ServiceWorkerState::Activated,
            });
        }
        self.pending_events
            .push(LifecycleEvent::ControllerChange { claimed });
        Ok(())
    }
}

/// Check if a state transition is valid
fn is_valid_transition(from: ServiceWorkerState, to: ServiceWorkerState) -> bool {
    use ServiceWorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Installed, Activating)
            | (Installed, Redundant)
            | (Activating, Activated)
            | (Activating, Redundant)
            | (Activated, Redundant)
    )
}
