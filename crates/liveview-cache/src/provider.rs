//! Presence manager that routes to the primary store or the fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use liveview_core::config::PresenceConfig;
use liveview_core::error::AppError;
use liveview_core::result::AppResult;
use liveview_core::traits::PresenceStore;
use liveview_core::types::{Topic, ViewerIdentity};

use crate::circuit::BackendAvailability;
use crate::memory::MemoryPresenceStore;

/// Presence facade used by the connection lifecycle.
///
/// Every operation completes: a primary-store error is logged, trips the
/// breaker, and the call is answered by the in-process fallback. Once the
/// breaker is open the primary store is never contacted again.
#[derive(Debug, Clone)]
pub struct PresenceManager {
    /// Shared primary store, if one is configured.
    primary: Option<Arc<dyn PresenceStore>>,
    /// Process-local fallback store.
    fallback: Arc<MemoryPresenceStore>,
    /// Breaker guarding the primary store.
    availability: Arc<BackendAvailability>,
}

impl PresenceManager {
    /// Create a presence manager from configuration.
    ///
    /// A Redis backend that cannot be reached at startup leaves the
    /// manager running on the fallback with the breaker already open.
    pub async fn new(config: &PresenceConfig) -> AppResult<Self> {
        let ttl = Duration::from_secs(config.ttl_seconds);
        let fallback = Arc::new(MemoryPresenceStore::new(ttl));

        match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis presence store");
                match crate::redis::RedisClient::connect(&config.redis).await {
                    Ok(client) => {
                        let store = crate::redis::RedisPresenceStore::new(client, ttl);
                        Ok(Self::with_stores(
                            Some(Arc::new(store)),
                            fallback,
                            Arc::new(BackendAvailability::new()),
                        ))
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis unavailable at startup, using in-process presence");
                        Ok(Self::with_stores(
                            None,
                            fallback,
                            Arc::new(BackendAvailability::tripped()),
                        ))
                    }
                }
            }
            "memory" => {
                info!("Initializing in-process presence store");
                Ok(Self::with_stores(
                    None,
                    fallback,
                    Arc::new(BackendAvailability::new()),
                ))
            }
            other => Err(AppError::configuration(format!(
                "Unknown presence provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }

    /// Create a manager from explicit parts (for testing and custom wiring).
    pub fn with_stores(
        primary: Option<Arc<dyn PresenceStore>>,
        fallback: Arc<MemoryPresenceStore>,
        availability: Arc<BackendAvailability>,
    ) -> Self {
        Self {
            primary,
            fallback,
            availability,
        }
    }

    /// A manager that only ever uses the in-process store.
    pub fn in_process(ttl: Duration) -> Self {
        Self::with_stores(
            None,
            Arc::new(MemoryPresenceStore::new(ttl)),
            Arc::new(BackendAvailability::new()),
        )
    }

    /// The breaker shared with whoever else needs to observe it.
    pub fn availability(&self) -> &Arc<BackendAvailability> {
        &self.availability
    }

    /// Name of the backend currently answering calls.
    pub fn active_backend(&self) -> &'static str {
        match self.live_primary() {
            Some(primary) => primary.name(),
            None => "fallback",
        }
    }

    /// Register a viewer.
    pub async fn add(&self, topic: &Topic, viewer: &ViewerIdentity) {
        if let Some(primary) = self.live_primary() {
            match primary.add(topic, viewer).await {
                Ok(()) => return,
                Err(e) => self.trip("add", topic, &e),
            }
        }
        // infallible in memory
        let _ = self.fallback.add(topic, viewer).await;
    }

    /// Unregister a viewer.
    pub async fn remove(&self, topic: &Topic, viewer: &ViewerIdentity) {
        if let Some(primary) = self.live_primary() {
            match primary.remove(topic, viewer).await {
                Ok(()) => return,
                Err(e) => self.trip("remove", topic, &e),
            }
        }
        let _ = self.fallback.remove(topic, viewer).await;
    }

    /// Keep a viewer counted for another TTL window.
    pub async fn refresh(&self, topic: &Topic, viewer: &ViewerIdentity) {
        if let Some(primary) = self.live_primary() {
            match primary.refresh(topic, viewer).await {
                Ok(()) => return,
                Err(e) => self.trip("refresh", topic, &e),
            }
        }
        let _ = self.fallback.refresh(topic, viewer).await;
    }

    /// Current number of distinct viewers of a topic.
    pub async fn count(&self, topic: &Topic) -> u64 {
        if let Some(primary) = self.live_primary() {
            match primary.count(topic).await {
                Ok(count) => return count,
                Err(e) => self.trip("count", topic, &e),
            }
        }
        self.fallback
            .count(topic)
            .await
            .unwrap_or(crate::memory::store::EMPTY_TOPIC_COUNT)
    }

    /// Health of the backend currently answering calls.
    ///
    /// A failed check is reported but does not trip the breaker; only a
    /// failed presence operation changes routing.
    pub async fn health_check(&self) -> bool {
        let result = match self.live_primary() {
            Some(primary) => primary.health_check().await,
            None => self.fallback.health_check().await,
        };
        match result {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(backend = self.active_backend(), error = %e, "Presence health check failed");
                false
            }
        }
    }

    fn live_primary(&self) -> Option<&Arc<dyn PresenceStore>> {
        self.primary
            .as_ref()
            .filter(|_| self.availability.is_available())
    }

    fn trip(&self, operation: &str, topic: &Topic, error: &AppError) {
        if self.availability.trip() {
            warn!(
                operation,
                topic = %topic,
                error = %error,
                "Primary presence store failed; switching to in-process fallback until restart"
            );
        } else {
            warn!(operation, topic = %topic, error = %error, "Primary presence store failed");
        }
    }
}
