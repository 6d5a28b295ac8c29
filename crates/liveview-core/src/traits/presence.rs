//! Presence store trait for pluggable presence backends.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{Topic, ViewerIdentity};

/// A set-like store of viewers per topic with sliding expiry.
///
/// Implementations must make `add` and `remove` atomic with respect to
/// each other for the same topic; callers take no locks of their own.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Add a viewer to the topic and (re)start its TTL. Idempotent.
    async fn add(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()>;

    /// Remove a viewer from the topic. Removing an absent viewer is a no-op.
    async fn remove(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()>;

    /// Re-add a viewer and reset its TTL. Used for keepalive.
    async fn refresh(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()> {
        self.add(topic, viewer).await
    }

    /// Number of distinct, unexpired viewers of the topic.
    async fn count(&self, topic: &Topic) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
