//! Single broadcast group with member tracking.

use std::collections::HashMap;
use std::sync::Arc;

use liveview_core::types::{Topic, ViewerIdentity};

use crate::connection::handle::{ConnectionHandle, ConnectionId};

/// The live connections watching one topic.
#[derive(Debug, Clone)]
pub struct Group {
    /// Topic this group fans out for.
    pub topic: Topic,
    /// Member connections by ID.
    members: HashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl Group {
    /// Creates a new empty group.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            members: HashMap::new(),
        }
    }

    /// Adds a member.
    pub fn join(&mut self, handle: Arc<ConnectionHandle>) {
        self.members.insert(handle.id, handle);
    }

    /// Removes a member.
    pub fn leave(&mut self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.members.remove(conn_id)
    }

    /// Returns member count.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the group has any members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether any member connection belongs to the viewer.
    pub fn has_viewer(&self, viewer: &ViewerIdentity) -> bool {
        self.members.values().any(|h| &h.viewer == viewer)
    }

    /// Returns all member handles.
    pub fn members(&self) -> Vec<Arc<ConnectionHandle>> {
        self.members.values().cloned().collect()
    }
}
