//! Window Clients
//!
//! The windows of the origin as the worker sees them.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::RwLock;

use crate::error::WorkerError;
use crate::request::UrlParts;

/// Clients handle shared between the worker and the host
pub type SharedClients = Arc<RwLock<Clients>>;

/// Window client ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Get raw value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Client info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client ID
    pub id: ClientId,
    /// Current URL of the window
    pub url: String,
    /// Whether the window has focus
    pub focused: bool,
    /// Whether the current worker controls this window
    pub controlled: bool,
}

/// Clients API
#[derive(Debug)]
pub struct Clients {
    next_id: u64,
    clients: Vec<ClientInfo>,
}

impl Clients {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_id: 1,
            clients: Vec::new(),
        }
    }

    /// Wrap into a shareable handle
    pub fn shared(self) -> SharedClients {
        Arc::new(RwLock::new(self))
    }

    /// Track an already open, uncontrolled window
    pub fn add(&mut self, url: impl Into<String>) -> ClientId {
        let id = self.allocate_id();
        self.clients.push(ClientInfo {
            id,
            url: url.into(),
            focused: false,
            controlled: false,
        });
        id
    }

    /// Get client by ID
    pub fn get(&self, id: ClientId) -> Option<&ClientInfo> {
        self.clients.iter().find(|c| c.id == id)
    }

    /// All window clients in creation order
    pub fn match_all(&self) -> Vec<&ClientInfo> {
        self.clients.iter().collect()
    }

    /// First window whose URL equals `url`; absolute and relative forms of
    /// the same path plus query compare equal
    pub fn find_by_url(&self, url: &str) -> Option<&ClientInfo> {
        let wanted = UrlParts::parse(url).cache_key();
        self.clients
            .iter()
            .find(|c| UrlParts::parse(&c.url).cache_key() == wanted)
    }

    /// Give `id` the focus
    pub fn focus(&mut self, id: ClientId) -> Result<&ClientInfo, WorkerError> {
        if self.get(id).is_none() {
            return Err(WorkerError::ClientNotFound(id.raw()));
        }
        for client in &mut self.clients {
            client.focused = client.id == id;
        }
        self.get(id).ok_or(WorkerError::ClientNotFound(id.raw()))
    }

    /// Open a new focused window at `url`
    pub fn open_window(&mut self, url: &str) -> ClientInfo {
        let id = self.allocate_id();
        for client in &mut self.clients {
            client.focused = false;
        }
        let client = ClientInfo {
            id,
            url: String::from(url),
            focused: true,
            controlled: true,
        };
        self.clients.push(client.clone());
        client
    }

    /// Take control of every window. Returns how many changed hands.
    pub fn claim(&mut self) -> usize {
        let mut claimed = 0;
        for client in self.clients.iter_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    /// Drop every window's controller
    pub fn release(&mut self) {
        for client in &mut self.clients {
            client.controlled = false;
        }
    }

    /// Forget a closed window
    pub fn remove(&mut self, id: ClientId) -> bool {
        let before = self.clients.len();
        self.clients.retain(|c| c.id != id);
        self.clients.len() != before
    }

    fn allocate_id(&mut self) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for Clients {
    fn default() -> Self {
        Self::new()
    }
}
