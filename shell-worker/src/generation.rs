//! Cache Generations
//!
//! Every cache the worker owns is named `<prefix>-<role>-<version>`. A worker
//! version owns exactly two generations, the precache and the runtime cache;
//! anything else found in storage belongs to an older version and is
//! deleted when this one activates.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::WorkerConfig;

/// Logical role of a cache generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheRole {
    /// Filled eagerly at install time from the manifest
    Precache,
    /// Filled lazily from successful live responses
    Runtime,
}

impl CacheRole {
    /// Name fragment for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precache => "precache",
            Self::Runtime => "runtime",
        }
    }
}

/// Build the generation name for a role and version
pub fn generation_name(prefix: &str, role: CacheRole, version: &str) -> String {
    alloc::format!("{}-{}-{}", prefix, role.as_str(), version)
}

/// The two current generation names of one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    precache: String,
    runtime: String,
}

impl CacheNames {
    /// Names for `prefix` at `version`
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            precache: generation_name(prefix, CacheRole::Precache, version),
            runtime: generation_name(prefix, CacheRole::Runtime, version),
        }
    }

    /// Names for the configured prefix and version
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(&config.cache_prefix, &config.version)
    }

    /// Name of the generation playing `role`
    pub fn name(&self, role: CacheRole) -> &str {
        match role {
            CacheRole::Precache => &self.precache,
            CacheRole::Runtime => &self.runtime,
        }
    }

    /// Precache name
    pub fn precache(&self) -> &str {
        &self.precache
    }

    /// Runtime cache name
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    /// Whether `name` is one of the two current generations
    pub fn is_current(&self, name: &str) -> bool {
        name == self.precache || name == self.runtime
    }

    /// Names from `existing` that are not current
    pub fn orphaned<'a, I>(&self, existing: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        existing
            .into_iter()
            .filter(|name| !self.is_current(name))
            .map(String::from)
            .collect()
    }
}
