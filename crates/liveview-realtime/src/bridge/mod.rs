//! Broadcast transports: how a count update reaches every member of a
//! topic's group, in this process and in every other one.

pub mod local;
pub mod redis_pubsub;

use async_trait::async_trait;

use liveview_core::types::Topic;

use crate::message::types::OutboundMessage;

pub use local::LocalBroadcast;
#[cfg(feature = "redis-pubsub")]
pub use redis_pubsub::RedisBroadcast;

/// Fan-out of a message to all members of a topic's broadcast group.
///
/// Publishing never fails from the caller's point of view. A transport
/// that cannot reach its peers must at least deliver to local members.
#[async_trait]
pub trait BroadcastTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Short transport name for logs and health output.
    fn name(&self) -> &'static str;

    /// Deliver `msg` to every connection joined to `topic`, including the
    /// sender's own connection.
    async fn publish(&self, topic: &Topic, msg: &OutboundMessage);
}
