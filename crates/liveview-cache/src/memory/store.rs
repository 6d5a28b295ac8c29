//! In-memory presence store, scoped to the current process.
//!
//! Used when Redis is not configured or has been marked unavailable.
//! Counts are only accurate for viewers connected to this process.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use liveview_core::result::AppResult;
use liveview_core::traits::PresenceStore;
use liveview_core::types::{Topic, ViewerIdentity};

/// Count reported for a topic with no recorded viewers.
///
/// Whoever asks for the count is connected, so the page never shows
/// "0 viewers" to its only viewer.
pub const EMPTY_TOPIC_COUNT: u64 = 1;

/// In-memory presence store.
#[derive(Debug)]
pub struct MemoryPresenceStore {
    /// Topic → viewer key → expiry deadline.
    topics: DashMap<Topic, HashMap<String, Instant>>,
    /// Sliding expiry window per viewer.
    ttl: Duration,
}

impl MemoryPresenceStore {
    /// Create a new in-memory store.
    pub fn new(ttl: Duration) -> Self {
        Self {
            topics: DashMap::new(),
            ttl,
        }
    }

    /// Number of topics currently holding at least one entry.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    fn prune(viewers: &mut HashMap<String, Instant>, now: Instant) {
        viewers.retain(|_, deadline| *deadline > now);
    }
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()> {
        let now = Instant::now();
        let mut viewers = self.topics.entry(topic.clone()).or_default();
        Self::prune(&mut viewers, now);
        viewers.insert(viewer.member_key(), now + self.ttl);
        Ok(())
    }

    async fn remove(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()> {
        // the shard guard must be released before remove_if re-locks it
        let emptied = {
            match self.topics.get_mut(topic) {
                Some(mut viewers) => {
                    viewers.remove(&viewer.member_key());
                    viewers.is_empty()
                }
                None => false,
            }
        };
        if emptied {
            self.topics.remove_if(topic, |_, viewers| viewers.is_empty());
        }
        debug!(topic = %topic, viewer = %viewer, "Fallback presence removed");
        Ok(())
    }

    async fn count(&self, topic: &Topic) -> AppResult<u64> {
        let now = Instant::now();
        let live = match self.topics.get_mut(topic) {
            Some(mut viewers) => {
                Self::prune(&mut viewers, now);
                viewers.len() as u64
            }
            None => 0,
        };

        if live == 0 {
            self.topics.remove_if(topic, |_, viewers| viewers.is_empty());
            return Ok(EMPTY_TOPIC_COUNT);
        }
        Ok(live)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
