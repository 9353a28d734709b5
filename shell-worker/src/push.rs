//! Push Notifications
//!
//! Push payloads are optional JSON objects `{ title, body, tag, data }`.
//! Every field may be missing and a payload that does not parse is treated
//! as empty, so a push always produces a notification.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::Deserialize;
use serde_json::Value;

use crate::config::NotificationDefaults;
use crate::error::WorkerError;

/// Decoded push payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tag: Option<String>,
    /// Free-form data; `data.url` is the click target
    pub data: Option<Value>,
}

impl PushPayload {
    /// Decode a push body, falling back to an empty payload
    pub fn parse(bytes: Option<&[u8]>) -> Self {
        let Some(bytes) = bytes else {
            return Self::default();
        };
        match serde_json::from_slice::<PushPayload>(bytes) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[SW] unreadable push payload, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// `data.url`, if present and a string
    pub fn target_url(&self) -> Option<&str> {
        self.data.as_ref()?.get("url")?.as_str()
    }
}

/// A notification shown by the worker
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub body: String,
    /// Replacement key: a newer notification with the same tag wins
    pub tag: String,
    pub icon: String,
    pub badge: String,
    pub sound: String,
    /// Page to focus or open on click
    pub target_url: String,
    pub data: Option<Value>,
}

impl Notification {
    /// Build a notification from a payload, filling gaps from `defaults`
    pub fn from_payload(id: u64, payload: PushPayload, defaults: &NotificationDefaults) -> Self {
        let target_url = payload
            .target_url()
            .map(|url| url.to_string())
            .unwrap_or_else(|| defaults.url.clone());
        Self {
            id,
            title: payload.title.unwrap_or_else(|| defaults.title.clone()),
            body: payload.body.unwrap_or_else(|| defaults.body.clone()),
            tag: payload.tag.unwrap_or_else(|| defaults.tag.clone()),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            sound: defaults.sound.clone(),
            target_url,
            data: payload.data,
        }
    }
}

/// Notifications currently on screen, keyed by tag
#[derive(Debug, Default)]
pub struct NotificationTray {
    next_id: u64,
    by_tag: BTreeMap<String, Notification>,
}

impl NotificationTray {
    /// Create an empty tray
    pub fn new() -> Self {
        Self {
            next_id: 1,
            by_tag: BTreeMap::new(),
        }
    }

    /// Show a notification for `payload`, replacing any with the same tag
    pub fn show(&mut self, payload: PushPayload, defaults: &NotificationDefaults) -> &Notification {
        let id = self.allocate_id();
        let notification = Notification::from_payload(id, payload, defaults);
        let tag = notification.tag.clone();
        if let Some(old) = self.by_tag.insert(tag.clone(), notification) {
            log::debug!("[SW] notification {} replaced by {} (tag {})", old.id, id, tag);
        }
        &self.by_tag[&tag]
    }

    /// Close a notification by id
    pub fn close(&mut self, id: u64) -> Result<Notification, WorkerError> {
        let tag = self
            .by_tag
            .values()
            .find(|n| n.id == id)
            .map(|n| n.tag.clone())
            .ok_or(WorkerError::NotificationNotFound(id))?;
        self.by_tag
            .remove(&tag)
            .ok_or(WorkerError::NotificationNotFound(id))
    }

    /// Look up a notification by id
    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.by_tag.values().find(|n| n.id == id)
    }

    /// All visible notifications
    pub fn list(&self) -> Vec<&Notification> {
        self.by_tag.values().collect()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }
}
