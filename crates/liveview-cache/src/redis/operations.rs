//! Redis presence store.
//!
//! Each topic is a sorted set whose members are viewer keys and whose
//! scores are per-viewer expiry deadlines in unix milliseconds. Expired
//! members are pruned in the same transaction that counts the set.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tracing::debug;

use liveview_core::error::{AppError, ErrorKind};
use liveview_core::result::AppResult;
use liveview_core::traits::PresenceStore;
use liveview_core::types::{Topic, ViewerIdentity};

use super::client::RedisClient;
use crate::keys;

/// Redis-backed presence store shared by every server process.
#[derive(Debug, Clone)]
pub struct RedisPresenceStore {
    /// Redis client.
    client: RedisClient,
    /// Sliding expiry window per viewer.
    ttl: Duration,
}

impl RedisPresenceStore {
    /// Create a new Redis presence store.
    pub fn new(client: RedisClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    fn ttl_millis(&self) -> i64 {
        ttl_millis(self.ttl)
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Score stored for a viewer added or refreshed at `now_ms`.
fn expiry_score(now_ms: i64, ttl: Duration) -> i64 {
    now_ms.saturating_add(ttl_millis(ttl))
}

/// Highest score that counts as expired at `now_ms`.
///
/// A viewer is live strictly before its deadline, matching the
/// in-process store.
fn expired_through(now_ms: i64) -> i64 {
    now_ms
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn add(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()> {
        let key = self.client.prefixed_key(&keys::presence_set(topic));
        let deadline = expiry_score(Utc::now().timestamp_millis(), self.ttl);
        let mut conn = self.client.conn_mut();

        // MULTI ZADD PEXPIRE EXEC
        let _: () = redis::pipe()
            .atomic()
            .zadd(&key, viewer.member_key(), deadline)
            .ignore()
            .pexpire(&key, self.ttl_millis())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(topic = %topic, viewer = %viewer, "Presence added");
        Ok(())
    }

    async fn remove(&self, topic: &Topic, viewer: &ViewerIdentity) -> AppResult<()> {
        let key = self.client.prefixed_key(&keys::presence_set(topic));
        let mut conn = self.client.conn_mut();
        let removed: i64 = conn
            .zrem(&key, viewer.member_key())
            .await
            .map_err(Self::map_err)?;

        debug!(topic = %topic, viewer = %viewer, removed, "Presence removed");
        Ok(())
    }

    async fn count(&self, topic: &Topic) -> AppResult<u64> {
        let key = self.client.prefixed_key(&keys::presence_set(topic));
        let cutoff = expired_through(Utc::now().timestamp_millis());
        let mut conn = self.client.conn_mut();

        let (_pruned, count): (i64, u64) = redis::pipe()
            .atomic()
            .zrembyscore(&key, "-inf", cutoff)
            .zcard(&key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use liveview_core::config::RedisPresenceConfig;

    use super::*;

    const TTL: Duration = Duration::from_secs(120);

    // ZREMRANGEBYSCORE -inf cutoff keeps only scores above the cutoff
    fn is_live(score: i64, now_ms: i64) -> bool {
        score > expired_through(now_ms)
    }

    #[test]
    fn test_viewer_live_until_deadline() {
        let added_at = 1_700_000_000_000;
        let score = expiry_score(added_at, TTL);
        assert_eq!(score, added_at + 120_000);

        assert!(is_live(score, added_at));
        assert!(is_live(score, added_at + 119_999));
        assert!(!is_live(score, added_at + 120_000));
    }

    #[test]
    fn test_refresh_moves_deadline() {
        let first = expiry_score(0, TTL);
        let refreshed = expiry_score(100_000, TTL);
        assert!(!is_live(first, 130_000));
        assert!(is_live(refreshed, 130_000));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        assert_eq!(expiry_score(i64::MAX - 1, Duration::from_secs(60)), i64::MAX);
        assert_eq!(ttl_millis(Duration::MAX), i64::MAX);
    }

    async fn live_store(ttl: Duration) -> RedisPresenceStore {
        let config = RedisPresenceConfig {
            url: std::env::var("LIVEVIEW_TEST_REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            key_prefix: format!("liveview-test:{}:", unique_suffix()),
        };
        let client = RedisClient::connect(&config).await.unwrap();
        RedisPresenceStore::new(client, ttl)
    }

    fn unique_suffix() -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    }

    fn viewer(token: &str) -> ViewerIdentity {
        ViewerIdentity::Session(token.to_string())
    }

    #[tokio::test]
    #[ignore = "needs a Redis server; run with --ignored"]
    async fn test_redis_counts_distinct_viewers() {
        let store = live_store(TTL).await;
        let topic = Topic::product(42);

        assert_eq!(store.count(&topic).await.unwrap(), 0);
        store.add(&topic, &viewer("a")).await.unwrap();
        store.add(&topic, &viewer("a")).await.unwrap();
        store.add(&topic, &viewer("b")).await.unwrap();
        assert_eq!(store.count(&topic).await.unwrap(), 2);

        store.remove(&topic, &viewer("a")).await.unwrap();
        store.remove(&topic, &viewer("absent")).await.unwrap();
        assert_eq!(store.count(&topic).await.unwrap(), 1);
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server; run with --ignored"]
    async fn test_redis_prunes_expired_viewers() {
        let store = live_store(Duration::from_millis(300)).await;
        let topic = Topic::product(7);

        store.add(&topic, &viewer("stale")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.add(&topic, &viewer("fresh")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.count(&topic).await.unwrap(), 1);
    }
}
