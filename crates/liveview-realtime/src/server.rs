//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tracing::info;

use liveview_cache::PresenceManager;
use liveview_core::config::AppConfig;
use liveview_core::error::AppError;
use liveview_core::result::AppResult;

use crate::bridge::{BroadcastTransport, LocalBroadcast};
use crate::channel::registry::GroupRegistry;
use crate::connection::identity::ViewerResolver;
use crate::connection::manager::ConnectionManager;
use crate::metrics::RealtimeMetrics;

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection lifecycle.
    pub connections: Arc<ConnectionManager>,
    /// Broadcast groups.
    pub groups: Arc<GroupRegistry>,
    /// Viewer identity resolution.
    pub resolver: Arc<ViewerResolver>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.groups.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and, when configured, starts the Redis
    /// broadcast relay.
    pub async fn new(config: &AppConfig, presence: PresenceManager) -> AppResult<Self> {
        let metrics = Arc::new(RealtimeMetrics::new());
        let groups = Arc::new(GroupRegistry::new());
        let local = LocalBroadcast::new(groups.clone(), metrics.clone());
        let transport = build_transport(config, local).await?;

        info!(
            transport = transport.name(),
            presence = presence.active_backend(),
            "Real-time engine initialized"
        );

        let connections = Arc::new(ConnectionManager::new(
            config.realtime.clone(),
            presence,
            groups.clone(),
            transport,
            metrics.clone(),
        ));

        Ok(Self {
            connections,
            groups,
            resolver: Arc::new(ViewerResolver::new(&config.session)),
            metrics,
        })
    }

    /// Initiates a graceful shutdown of the real-time engine.
    ///
    /// Every live connection runs its disconnect path, so viewers are
    /// removed from presence before the process exits.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.connections.close_all().await;
        info!("Real-time engine shut down");
    }
}

async fn build_transport(
    config: &AppConfig,
    local: LocalBroadcast,
) -> AppResult<Arc<dyn BroadcastTransport>> {
    match config.realtime.broadcast.as_str() {
        "local" => Ok(Arc::new(local)),
        #[cfg(feature = "redis-pubsub")]
        "redis" => Ok(redis_transport(config, local).await),
        other => Err(AppError::configuration(format!(
            "Unknown broadcast transport: '{other}'. Supported: local, redis"
        ))),
    }
}

/// Start the Redis relay, or fall back to local delivery if Redis is down.
#[cfg(feature = "redis-pubsub")]
async fn redis_transport(config: &AppConfig, local: LocalBroadcast) -> Arc<dyn BroadcastTransport> {
    use liveview_cache::redis::RedisClient;

    use crate::bridge::RedisBroadcast;

    let started = match RedisClient::connect(&config.presence.redis).await {
        Ok(client) => RedisBroadcast::start(&client, local.clone()).await,
        Err(e) => Err(e),
    };
    match started {
        Ok(relay) => Arc::new(relay),
        Err(e) => {
            tracing::warn!(error = %e, "Broadcast relay unavailable; delivering locally only");
            Arc::new(local)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use liveview_core::error::ErrorKind;
    use liveview_core::types::{Topic, ViewerIdentity};

    use super::*;
    use crate::connection::manager::ConnectRequest;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.presence.provider = "memory".to_string();
        config
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_connection() {
        let config = memory_config();
        let presence = PresenceManager::new(&config.presence).await.unwrap();
        let engine = RealtimeEngine::new(&config, presence).await.unwrap();

        let (guard, _rx) = engine
            .connections
            .connect(ConnectRequest {
                topic: Topic::product(1),
                viewer: ViewerIdentity::Session("a".into()),
                user_agent: None,
            })
            .await
            .unwrap();
        assert_eq!(engine.connections.connection_count(), 1);

        engine.shutdown().await;
        assert_eq!(engine.connections.connection_count(), 0);
        assert!(guard.handle().closed_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_unknown_transport_is_rejected() {
        let mut config = memory_config();
        config.realtime.broadcast = "carrier-pigeon".to_string();
        let presence = PresenceManager::in_process(Duration::from_secs(120));
        let err = RealtimeEngine::new(&config, presence).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
