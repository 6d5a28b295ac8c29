//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use liveview_core::types::{Topic, ViewerIdentity};

use super::state::ConnectionState;
use crate::message::types::OutboundMessage;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the sender channel for pushing messages to the client, the
/// topic and viewer the connection was admitted with, and its lifecycle
/// state.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Topic being watched
    pub topic: Topic,
    /// Viewer behind the connection
    pub viewer: ViewerIdentity,
    /// Sender for outbound messages
    sender: mpsc::Sender<OutboundMessage>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Lifecycle state
    state: AtomicU8,
    /// Cancelled once the connection is closed server-side
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new handle in the `Connecting` state.
    pub fn new(topic: Topic, viewer: ViewerIdentity, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            viewer,
            sender,
            connected_at: Utc::now(),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            closed: CancellationToken::new(),
        }
    }

    /// Send an outbound message to this connection
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if self.state().is_terminal() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`; returns `false` if the state was not `from`.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved && to.is_terminal() {
            self.closed.cancel();
        }
        moved
    }

    /// Whether the connection is registered and live.
    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    /// Resolves when the connection has been closed server-side.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}
