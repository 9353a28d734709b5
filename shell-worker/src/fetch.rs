//! Fetch Routing
//!
//! Network-first handling for every same-origin GET the worker intercepts.
//! Anything else is passed through untouched.
//!
//! Successful responses are mirrored into the runtime generation. A failed
//! cache write is logged and never affects the response being returned.

use alloc::sync::Arc;

use crate::cache::SharedCacheStorage;
use crate::clock::Clock;
use crate::fallback::{FallbackChain, FallbackHit};
use crate::generation::CacheNames;
use crate::network::{Network, NetworkError};
use crate::request::{Request, RequestMethod, RequestMode, Response};

/// How the worker treats a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Not intercepted (cross-origin or non-GET)
    Passthrough,
    /// Document load: falls back to the app shell
    Navigation,
    /// Sub-resource or API GET
    Asset,
}

/// Classify a request against the worker's origin
pub fn classify(request: &Request, origin: &str) -> RequestClass {
    if request.method != RequestMethod::Get || !request.url_parts().is_same_origin(origin) {
        return RequestClass::Passthrough;
    }
    if request.mode == RequestMode::Navigate || request.accepts_html() {
        RequestClass::Navigation
    } else {
        RequestClass::Asset
    }
}

/// Where a response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchSource {
    /// Live network response
    Network,
    /// Cache hit from a fallback chain step
    Cache { cache_name: alloc::string::String, step: usize },
}

/// Result of handling a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the page performs the request itself
    Passthrough,
    /// A response was produced
    Responded { response: Response, source: FetchSource },
    /// Network failed and every fallback missed
    Failed(NetworkError),
}

impl FetchOutcome {
    /// Response, if one was produced
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Responded { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Whether the response was served from a cache
    pub fn from_cache(&self) -> bool {
        matches!(
            self,
            FetchOutcome::Responded {
                source: FetchSource::Cache { .. },
                ..
            }
        )
    }

    fn from_hit(hit: FallbackHit) -> Self {
        FetchOutcome::Responded {
            response: hit.response,
            source: FetchSource::Cache {
                cache_name: hit.cache_name,
                step: hit.step,
            },
        }
    }
}

/// Network-first router with cache fallback
pub struct FetchRouter {
    origin: alloc::string::String,
    names: CacheNames,
    navigation_chain: FallbackChain,
    asset_chain: FallbackChain,
    caches: SharedCacheStorage,
    network: Arc<dyn Network>,
    clock: Arc<dyn Clock>,
}

impl FetchRouter {
    /// Create a router
    pub fn new(
        origin: &str,
        names: CacheNames,
        navigation_chain: FallbackChain,
        caches: SharedCacheStorage,
        network: Arc<dyn Network>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            origin: alloc::string::String::from(origin),
            names,
            navigation_chain,
            asset_chain: FallbackChain::asset(),
            caches,
            network,
            clock,
        }
    }

    /// Navigation fallback chain
    pub fn navigation_chain(&self) -> &FallbackChain {
        &self.navigation_chain
    }

    /// Asset fallback chain
    pub fn asset_chain(&self) -> &FallbackChain {
        &self.asset_chain
    }

    /// Handle one fetch
    pub fn handle(&self, request: &Request) -> FetchOutcome {
        match classify(request, &self.origin) {
            RequestClass::Passthrough => FetchOutcome::Passthrough,
            RequestClass::Navigation => self.network_first(request, &self.navigation_chain),
            RequestClass::Asset => self.network_first(request, &self.asset_chain),
        }
    }

    fn network_first(&self, request: &Request, chain: &FallbackChain) -> FetchOutcome {
        match self.network.fetch(request) {
            Ok(response) => {
                if response.is_cacheable() {
                    self.mirror(request, &response);
                } else {
                    log::debug!(
                        "[SW] not caching {} (status {})",
                        request.url,
                        response.status
                    );
                }
                FetchOutcome::Responded {
                    response,
                    source: FetchSource::Network,
                }
            }
            Err(err) => {
                let url = request.url_parts();
                let hit = {
                    let caches = self.caches.read();
                    chain.resolve(&url, &caches, &self.names)
                };
                match hit {
                    Some(hit) => {
                        log::debug!(
                            "[SW] offline hit for {} via {} ({})",
                            request.url,
                            hit.key,
                            hit.cache_name
                        );
                        FetchOutcome::from_hit(hit)
                    }
                    None => {
                        log::warn!("[SW] {} failed with no cached fallback: {}", request.url, err);
                        FetchOutcome::Failed(err)
                    }
                }
            }
        }
    }

    fn mirror(&self, request: &Request, response: &Response) {
        let key = request.url_parts().cache_key();
        let now = self.clock.now_ms();
        if let Err(e) = self
            .caches
            .write()
            .put(self.names.runtime(), &key, response, now)
        {
            log::warn!("[SW] runtime cache write for {} dropped: {}", key, e);
        }
    }
}
