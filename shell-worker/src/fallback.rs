//! Offline Fallback Chains
//!
//! When the network fails, the cache is consulted through an ordered list of
//! lookup steps. The first step that produces a hit wins. Runtime entries are
//! fresher than precache entries, so within every key the runtime generation
//! is tried first.
//!
//! Navigation chain: exact key, then each shell fallback (`/index.html`, `/`).
//! Asset chain: exact key, then the key with its query string stripped.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::cache::CacheStorage;
use crate::generation::{CacheNames, CacheRole};
use crate::request::{Response, UrlParts};

/// Where a lookup step takes its key from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// The request's own path plus query
    Exact,
    /// The request path without its query; skipped when there is no query
    StripQuery,
    /// A fixed key such as the app shell
    Literal(String),
}

impl KeySource {
    /// Key for `url`, or `None` when the step does not apply
    pub fn resolve(&self, url: &UrlParts<'_>) -> Option<String> {
        match self {
            KeySource::Exact => Some(url.cache_key()),
            KeySource::StripQuery if url.has_query() => Some(url.path_key()),
            KeySource::StripQuery => None,
            KeySource::Literal(key) => Some(key.clone()),
        }
    }
}

/// One lookup: a key source in a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupStep {
    pub role: CacheRole,
    pub key: KeySource,
}

impl LookupStep {
    fn pair(key: KeySource) -> [LookupStep; 2] {
        [
            LookupStep {
                role: CacheRole::Runtime,
                key: key.clone(),
            },
            LookupStep {
                role: CacheRole::Precache,
                key,
            },
        ]
    }
}

/// Result of a successful chain evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackHit {
    /// Index of the step that matched
    pub step: usize,
    /// Generation the entry came from
    pub cache_name: String,
    /// Key that matched
    pub key: String,
    /// Response rebuilt from the entry
    pub response: Response,
}

/// Ordered lookup steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    steps: Vec<LookupStep>,
}

impl FallbackChain {
    /// Chain for navigations: exact key, then every shell key in order
    pub fn navigation<S: AsRef<str>>(shell_fallbacks: &[S]) -> Self {
        let mut steps = Vec::with_capacity(2 + shell_fallbacks.len() * 2);
        steps.extend(LookupStep::pair(KeySource::Exact));
        for shell in shell_fallbacks {
            steps.extend(LookupStep::pair(KeySource::Literal(
                shell.as_ref().to_string(),
            )));
        }
        Self { steps }
    }

    /// Chain for static assets and API GETs
    pub fn asset() -> Self {
        let mut steps = Vec::with_capacity(4);
        steps.extend(LookupStep::pair(KeySource::Exact));
        steps.extend(LookupStep::pair(KeySource::StripQuery));
        Self { steps }
    }

    /// Steps in evaluation order
    pub fn steps(&self) -> &[LookupStep] {
        &self.steps
    }

    /// Evaluate the chain, returning the first hit
    pub fn resolve(
        &self,
        url: &UrlParts<'_>,
        storage: &CacheStorage,
        names: &CacheNames,
    ) -> Option<FallbackHit> {
        self.steps.iter().enumerate().find_map(|(index, step)| {
            let key = step.key.resolve(url)?;
            let cache_name = names.name(step.role);
            storage.match_in(cache_name, &key).map(|entry| FallbackHit {
                step: index,
                cache_name: cache_name.to_string(),
                key,
                response: entry.to_response(),
            })
        })
    }
}
