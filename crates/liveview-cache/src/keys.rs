//! Redis key builders for presence sets and broadcast channels.
//!
//! Keys returned here are unprefixed; the Redis client applies the
//! configured key prefix.

use liveview_core::types::Topic;

/// Key of the sorted set holding viewers of a topic.
pub fn presence_set(topic: &Topic) -> String {
    format!("presence:{topic}")
}

/// Pub/sub channel carrying count updates for a topic.
pub fn broadcast_channel(topic: &Topic) -> String {
    format!("broadcast:{topic}")
}

/// Pattern matching every broadcast channel.
pub const BROADCAST_PATTERN: &str = "broadcast:*";

/// Recover the topic from an unprefixed broadcast channel name.
pub fn topic_from_broadcast_channel(channel: &str) -> Option<Topic> {
    channel
        .strip_prefix("broadcast:")
        .filter(|rest| !rest.is_empty())
        .map(Topic::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_channel_roundtrip() {
        let topic = Topic::product(42);
        let channel = broadcast_channel(&topic);
        assert_eq!(channel, "broadcast:product:42");
        assert_eq!(topic_from_broadcast_channel(&channel), Some(topic));
    }

    #[test]
    fn test_foreign_channel_is_ignored() {
        assert_eq!(topic_from_broadcast_channel("presence:product:1"), None);
        assert_eq!(topic_from_broadcast_channel("broadcast:"), None);
    }
}
