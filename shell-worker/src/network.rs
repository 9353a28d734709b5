//! Network seam.
//!
//! The worker never talks to sockets itself; it goes through [`Network`].
//! [`ScriptedNetwork`] serves canned responses and can be switched offline,
//! which is how hosts without a real stack (and the tests) drive the worker.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, RwLock};

use crate::request::{Request, Response, UrlParts};

/// Network failure kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No connectivity
    Offline,
    /// Request timed out in the underlying stack
    Timeout,
    /// Connection refused or reset
    ConnectionFailed(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Offline => write!(f, "network offline"),
            NetworkError::Timeout => write!(f, "request timed out"),
            NetworkError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
        }
    }
}

/// Performs a single request/response exchange.
pub trait Network: Send + Sync {
    /// Fetch a request from the network
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Network with canned responses keyed by path plus query.
///
/// Unknown URLs answer 404.
pub struct ScriptedNetwork {
    online: AtomicBool,
    routes: RwLock<BTreeMap<String, Response>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    /// Create an online network with no routes
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            routes: RwLock::new(BTreeMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `response` for `url`
    pub fn route(&self, url: &str, response: Response) {
        let key = UrlParts::parse(url).cache_key();
        self.routes.write().insert(key, response);
    }

    /// Stop serving `url`
    pub fn remove_route(&self, url: &str) {
        let key = UrlParts::parse(url).cache_key();
        self.routes.write().remove(&key);
    }

    /// Toggle connectivity
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Current connectivity
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Default for ScriptedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for ScriptedNetwork {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.requests.lock().push(request.url.clone());

        if !self.is_online() {
            return Err(NetworkError::Offline);
        }

        let key = request.url_parts().cache_key();
        Ok(self
            .routes
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(404)))
    }
}
