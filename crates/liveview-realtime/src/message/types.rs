//! Inbound and outbound WebSocket message type definitions.

use serde::{Deserialize, Serialize};

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Keepalive; refreshes the viewer's presence TTL.
    Ping,
    /// Any other `type` value. Ignored.
    #[serde(other)]
    Unknown,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Current number of distinct viewers of the topic.
    CountUpdate {
        /// Viewer count.
        count: u64,
    },
    /// Reply to a client ping.
    Pong,
}
