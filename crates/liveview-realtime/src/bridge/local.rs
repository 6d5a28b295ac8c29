//! In-process fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use liveview_core::types::Topic;

use super::BroadcastTransport;
use crate::channel::registry::GroupRegistry;
use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;

/// Delivers straight into this process's broadcast groups.
#[derive(Debug, Clone)]
pub struct LocalBroadcast {
    /// Group registry.
    groups: Arc<GroupRegistry>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
}

impl LocalBroadcast {
    /// Creates a local transport over the given registry.
    pub fn new(groups: Arc<GroupRegistry>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self { groups, metrics }
    }

    /// Deliver to local members and return how many accepted.
    pub fn deliver(&self, topic: &Topic, msg: &OutboundMessage) -> usize {
        let sent = self.groups.deliver(topic, msg);
        self.metrics.message_sent_count(sent as u64);
        debug!(topic = %topic, sent, "Delivered to local group");
        sent
    }
}

#[async_trait]
impl BroadcastTransport for LocalBroadcast {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn publish(&self, topic: &Topic, msg: &OutboundMessage) {
        self.deliver(topic, msg);
    }
}
