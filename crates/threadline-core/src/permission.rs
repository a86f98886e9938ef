//! Pending permission requests.
//!
//! The server asks before running some tools. Requests queue up FIFO; the
//! front one is "current" and is what the UI prompts for.

use serde::Deserialize;
use std::collections::VecDeque;
use tracing::debug;

/// A pending approval request for a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Permission {
    pub id: String,
    pub session_id: String,
    pub message_id: String,

    /// The tool call waiting on this permission, if it is tied to one.
    #[serde(default)]
    pub call_id: Option<String>,

    /// Permission kind, e.g. `bash` or `edit`.
    #[serde(rename = "type")]
    pub kind: String,

    pub title: String,

    #[serde(default)]
    pub pattern: Option<String>,
}

/// FIFO of permission requests with at most one current.
#[derive(Debug, Clone, Default)]
pub struct PermissionQueue {
    queue: VecDeque<Permission>,
}

impl PermissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request. A request with a known id replaces the old copy in place.
    ///
    /// Returns `true` when the queue changed.
    pub fn push(&mut self, permission: Permission) -> bool {
        if let Some(existing) = self.queue.iter_mut().find(|p| p.id == permission.id) {
            if *existing == permission {
                return false;
            }
            *existing = permission;
            return true;
        }
        debug!(permission_id = %permission.id, "Permission queued");
        self.queue.push_back(permission);
        true
    }

    /// Drop a request once answered. Returns the removed request.
    pub fn reply(&mut self, permission_id: &str) -> Option<Permission> {
        let idx = self.queue.iter().position(|p| p.id == permission_id)?;
        self.queue.remove(idx)
    }

    pub fn current(&self) -> Option<&Permission> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.queue.iter()
    }

    /// Whether any queued request targets this tool call.
    pub fn is_pending_for_call(&self, call_id: &str) -> bool {
        self.queue
            .iter()
            .any(|p| p.call_id.as_deref() == Some(call_id))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
