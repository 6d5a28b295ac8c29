//! Group registry: topic → live connections, for local fan-out.

use std::sync::Arc;

use dashmap::DashMap;

use liveview_core::types::{Topic, ViewerIdentity};

use super::channel::Group;
use crate::connection::handle::ConnectionHandle;
use crate::message::types::OutboundMessage;

/// Registry of every broadcast group in this process.
///
/// Membership lives exactly as long as the connection; nothing here is
/// persisted.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    /// Topic → group.
    groups: DashMap<Topic, Group>,
}

impl GroupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
        }
    }

    /// Adds a connection to its topic's group.
    pub fn join(&self, handle: Arc<ConnectionHandle>) {
        self.groups
            .entry(handle.topic.clone())
            .or_insert_with(|| Group::new(handle.topic.clone()))
            .join(handle);
    }

    /// Removes a connection from its topic's group, dropping empty groups.
    pub fn leave(&self, handle: &ConnectionHandle) {
        let emptied = match self.groups.get_mut(&handle.topic) {
            Some(mut group) => {
                group.leave(&handle.id);
                group.is_empty()
            }
            None => false,
        };
        if emptied {
            self.groups.remove_if(&handle.topic, |_, group| group.is_empty());
        }
    }

    /// Delivers a message to every local member of the topic.
    ///
    /// Returns the number of members that accepted it.
    pub fn deliver(&self, topic: &Topic, msg: &OutboundMessage) -> usize {
        self.members(topic)
            .iter()
            .filter(|handle| handle.send(msg.clone()))
            .count()
    }

    /// Returns the member handles of a topic.
    pub fn members(&self, topic: &Topic) -> Vec<Arc<ConnectionHandle>> {
        self.groups
            .get(topic)
            .map(|group| group.members())
            .unwrap_or_default()
    }

    /// Whether the viewer still has another local connection to the topic.
    pub fn has_viewer(&self, topic: &Topic, viewer: &ViewerIdentity) -> bool {
        self.groups
            .get(topic)
            .map(|group| group.has_viewer(viewer))
            .unwrap_or(false)
    }

    /// Every connection in every group.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.groups
            .iter()
            .flat_map(|group| group.members())
            .collect()
    }

    /// Number of groups with at least one member.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total members across all groups.
    pub fn connection_count(&self) -> usize {
        self.groups.iter().map(|group| group.member_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::connection::state::ConnectionState;

    fn active_handle(
        topic: Topic,
        viewer: &str,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(
            topic,
            ViewerIdentity::Session(viewer.to_string()),
            tx,
        ));
        handle.transition(ConnectionState::Connecting, ConnectionState::Active);
        (handle, rx)
    }

    #[test]
    fn test_deliver_reaches_only_topic_members() {
        let registry = GroupRegistry::new();
        let (a, mut a_rx) = active_handle(Topic::product(1), "a");
        let (b, mut b_rx) = active_handle(Topic::product(1), "b");
        let (c, mut c_rx) = active_handle(Topic::product(2), "c");
        registry.join(a);
        registry.join(b);
        registry.join(c);

        let msg = OutboundMessage::CountUpdate { count: 2 };
        assert_eq!(registry.deliver(&Topic::product(1), &msg), 2);
        assert_eq!(a_rx.try_recv().unwrap(), msg);
        assert_eq!(b_rx.try_recv().unwrap(), msg);
        assert!(c_rx.try_recv().is_err());
    }

    #[test]
    fn test_leave_drops_empty_group() {
        let registry = GroupRegistry::new();
        let (a, _rx) = active_handle(Topic::product(1), "a");
        registry.join(a.clone());
        assert_eq!(registry.group_count(), 1);
        assert_eq!(registry.connection_count(), 1);

        registry.leave(&a);
        assert_eq!(registry.group_count(), 0);
        assert_eq!(registry.deliver(&Topic::product(1), &OutboundMessage::Pong), 0);
    }

    #[test]
    fn test_has_viewer_sees_other_tabs() {
        let registry = GroupRegistry::new();
        let (tab1, _rx1) = active_handle(Topic::product(1), "same");
        let (tab2, _rx2) = active_handle(Topic::product(1), "same");
        registry.join(tab1.clone());
        registry.join(tab2.clone());

        registry.leave(&tab1);
        assert!(registry.has_viewer(&Topic::product(1), &tab1.viewer));
        registry.leave(&tab2);
        assert!(!registry.has_viewer(&Topic::product(1), &tab2.viewer));
    }
}
