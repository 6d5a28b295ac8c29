//! Redis pub/sub relay for multi-process deployments.
//!
//! Every process publishes count updates to `{prefix}broadcast:{topic}`
//! and runs one pattern subscriber that hands relayed messages to its
//! local groups. The publishing process receives its own message back
//! through the subscriber, so nothing is delivered locally on the happy
//! path.

#[cfg(feature = "redis-pubsub")]
pub mod implementation {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use futures::StreamExt;
    use redis::aio::ConnectionManager;
    use tokio_util::sync::CancellationToken;
    use tracing::{debug, error, info, warn};

    use liveview_cache::keys;
    use liveview_cache::redis::RedisClient;
    use liveview_core::error::{AppError, ErrorKind};
    use liveview_core::result::AppResult;
    use liveview_core::types::Topic;

    use crate::bridge::BroadcastTransport;
    use crate::bridge::local::LocalBroadcast;
    use crate::message::serializer::{deserialize_outbound, serialize_outbound};
    use crate::message::types::OutboundMessage;

    /// Redis-backed broadcast transport.
    pub struct RedisBroadcast {
        /// Connection used for PUBLISH.
        conn: ConnectionManager,
        /// Key prefix applied to channel names.
        key_prefix: String,
        /// Local delivery, used by the subscriber and as the fallback.
        local: LocalBroadcast,
        /// Cleared when the subscriber task ends.
        subscriber_alive: Arc<AtomicBool>,
        /// Stops the subscriber task.
        shutdown: CancellationToken,
    }

    impl std::fmt::Debug for RedisBroadcast {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RedisBroadcast")
                .field("key_prefix", &self.key_prefix)
                .field("subscribed", &self.is_subscribed())
                .finish()
        }
    }

    impl RedisBroadcast {
        /// Subscribe to every broadcast channel and start relaying.
        pub async fn start(client: &RedisClient, local: LocalBroadcast) -> AppResult<Self> {
            let mut pubsub = client.client().get_async_pubsub().await.map_err(|e| {
                AppError::with_source(ErrorKind::Cache, "Failed to open Redis pub/sub connection", e)
            })?;

            let pattern = client.prefixed_key(keys::BROADCAST_PATTERN);
            pubsub.psubscribe(&pattern).await.map_err(|e| {
                AppError::with_source(ErrorKind::Cache, "Failed to subscribe to broadcasts", e)
            })?;
            info!(pattern = %pattern, "Subscribed to broadcast relay");

            let subscriber_alive = Arc::new(AtomicBool::new(true));
            let shutdown = CancellationToken::new();
            let prefix = client.prefix().to_string();

            let relay_local = local.clone();
            let alive = subscriber_alive.clone();
            let stop = shutdown.clone();
            tokio::spawn(async move {
                let messages = pubsub.into_on_message();
                tokio::pin!(messages);
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        next = messages.next() => match next {
                            Some(msg) => relay(&relay_local, &prefix, &msg),
                            None => {
                                error!("Broadcast relay subscription ended; delivering locally only");
                                break;
                            }
                        },
                    }
                }
                alive.store(false, Ordering::Release);
            });

            Ok(Self {
                conn: client.conn_mut(),
                key_prefix: client.prefix().to_string(),
                local,
                subscriber_alive,
                shutdown,
            })
        }

        /// Whether relayed messages are still being received.
        pub fn is_subscribed(&self) -> bool {
            self.subscriber_alive.load(Ordering::Acquire)
        }

        async fn publish_remote(&self, topic: &Topic, msg: &OutboundMessage) -> AppResult<()> {
            let payload = serialize_outbound(msg)?;
            let channel = format!("{}{}", self.key_prefix, keys::broadcast_channel(topic));
            let mut conn = self.conn.clone();
            redis::cmd("PUBLISH")
                .arg(&channel)
                .arg(payload)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Cache, "Redis PUBLISH failed", e))?;
            Ok(())
        }
    }

    /// Hand one relayed message to the local group it names.
    fn relay(local: &LocalBroadcast, prefix: &str, msg: &redis::Msg) {
        let channel = msg.get_channel_name();
        let Some(topic) = channel
            .strip_prefix(prefix)
            .and_then(keys::topic_from_broadcast_channel)
        else {
            debug!(channel, "Ignoring message on unrelated channel");
            return;
        };

        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!(channel, error = %e, "Unreadable relayed payload");
                return;
            }
        };

        match deserialize_outbound(&payload) {
            Ok(outbound) => {
                local.deliver(&topic, &outbound);
            }
            Err(e) => warn!(channel, error = %e, "Malformed relayed message"),
        }
    }

    #[async_trait]
    impl BroadcastTransport for RedisBroadcast {
        fn name(&self) -> &'static str {
            "redis"
        }

        async fn publish(&self, topic: &Topic, msg: &OutboundMessage) {
            if !self.is_subscribed() {
                self.local.deliver(topic, msg);
                return;
            }
            if let Err(e) = self.publish_remote(topic, msg).await {
                warn!(topic = %topic, error = %e, "Broadcast relay failed; delivering locally");
                self.local.deliver(topic, msg);
            }
        }
    }

    impl Drop for RedisBroadcast {
        fn drop(&mut self) {
            self.shutdown.cancel();
        }
    }
}

#[cfg(feature = "redis-pubsub")]
pub use implementation::RedisBroadcast;
