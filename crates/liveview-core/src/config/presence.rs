//! Presence store configuration.

use serde::{Deserialize, Serialize};

/// Presence store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Primary store: `"redis"` or `"memory"` (in-process only).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Seconds a viewer stays counted without a keepalive.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisPresenceConfig,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ttl_seconds: default_ttl(),
            redis: RedisPresenceConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisPresenceConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix applied to every presence and broadcast key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisPresenceConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_ttl() -> u64 {
    120
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "liveview:".to_string()
}
