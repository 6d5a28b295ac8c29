//! JSON serialization for WebSocket messages.

use super::types::{InboundMessage, OutboundMessage};
use super::validator::validate_inbound;

/// Serialize an outbound message.
pub fn serialize_outbound(msg: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize an outbound message relayed from another process.
pub fn deserialize_outbound(text: &str) -> Result<OutboundMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parse an inbound frame.
///
/// Oversized, empty, and malformed frames all come back as
/// [`InboundMessage::Unknown`]; clients never get an error reply.
pub fn parse_inbound(raw: &str) -> InboundMessage {
    if validate_inbound(raw).is_err() {
        return InboundMessage::Unknown;
    }
    serde_json::from_str(raw).unwrap_or(InboundMessage::Unknown)
}
