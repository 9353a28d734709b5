//! Offline Shell End-to-End Scenarios
//!
//! Drives the worker and the recovery module together the way a browser
//! would: one origin, one network, one cache storage, and any number of page
//! loads sharing a persisted `localStorage`.
//!
//! - `fixtures`: the simulated origin (`App`) and its page loads (`Page`)
//! - `assertions`: checks that report what they found instead of panicking
//! - scenario modules: test-only suites grouped by behaviour

#![no_std]
extern crate alloc;

pub mod assertions;
pub mod fixtures;

#[cfg(test)]
mod notifications;
#[cfg(test)]
mod offline;
