//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Whether a keepalive ping also rebroadcasts the viewer count.
    #[serde(default)]
    pub rebroadcast_on_ping: bool,
    /// Broadcast transport: `"local"` (single process) or `"redis"`.
    #[serde(default = "default_broadcast")]
    pub broadcast: String,
    /// Case-insensitive user-agent substrings that identify crawlers.
    #[serde(default = "default_bot_user_agents")]
    pub bot_user_agents: Vec<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            rebroadcast_on_ping: false,
            broadcast: default_broadcast(),
            bot_user_agents: default_bot_user_agents(),
        }
    }
}

fn default_channel_buffer() -> usize {
    64
}

fn default_broadcast() -> String {
    "local".to_string()
}

fn default_bot_user_agents() -> Vec<String> {
    [
        "bot",
        "spider",
        "crawl",
        "slurp",
        "googlebot",
        "bingbot",
        "yandex",
        "baiduspider",
        "duckduckbot",
        "facebookexternalhit",
        "ia_archiver",
        "semrush",
        "ahrefs",
        "petalbot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
