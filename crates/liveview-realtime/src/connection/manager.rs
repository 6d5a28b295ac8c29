//! Connection manager: the connect / keepalive / disconnect lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use liveview_cache::PresenceManager;
use liveview_core::config::RealtimeConfig;
use liveview_core::types::{Topic, ViewerIdentity};

use crate::bridge::BroadcastTransport;
use crate::channel::registry::GroupRegistry;
use crate::message::serializer::parse_inbound;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::{RealtimeMetrics, connections};

use super::bot_filter::BotFilter;
use super::guard::ConnectionGuard;
use super::handle::ConnectionHandle;
use super::state::ConnectionState;

/// Everything known about a connection before it is admitted.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Topic the client wants to watch.
    pub topic: Topic,
    /// Resolved viewer.
    pub viewer: ViewerIdentity,
    /// Raw `User-Agent` header, if sent.
    pub user_agent: Option<String>,
}

/// A connection that passed the bot filter but is not yet counted.
#[derive(Debug)]
pub struct PendingConnection {
    /// Handle in the `Connecting` state.
    handle: Arc<ConnectionHandle>,
    /// Outbound queue for the socket writer.
    receiver: mpsc::Receiver<OutboundMessage>,
}

/// Why a connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The user agent matched the crawler list.
    Bot,
}

/// Drives every connection through its lifecycle and keeps the presence
/// store and the broadcast groups in step.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Presence facade.
    presence: PresenceManager,
    /// Local broadcast groups.
    groups: Arc<GroupRegistry>,
    /// Cross-process fan-out.
    transport: Arc<dyn BroadcastTransport>,
    /// Crawler filter.
    bot_filter: BotFilter,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
    /// Set once `close_all` has started; late activations are abandoned.
    closing: AtomicBool,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        presence: PresenceManager,
        groups: Arc<GroupRegistry>,
        transport: Arc<dyn BroadcastTransport>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        let bot_filter = BotFilter::new(config.bot_user_agents.iter());
        Self {
            presence,
            groups,
            transport,
            bot_filter,
            metrics,
            config,
            closing: AtomicBool::new(false),
        }
    }

    /// Run the bot filter. Rejected requests touch no state at all.
    pub fn admit(&self, req: ConnectRequest) -> Result<PendingConnection, Rejection> {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(req.topic, req.viewer, tx));

        if self.bot_filter.is_bot(req.user_agent.as_deref()) {
            handle.transition(ConnectionState::Connecting, ConnectionState::Rejected);
            connections::record_bot_rejected(&self.metrics);
            info!(
                topic = %handle.topic,
                user_agent = req.user_agent.as_deref().unwrap_or_default(),
                "Rejected crawler connection"
            );
            return Err(Rejection::Bot);
        }

        Ok(PendingConnection {
            handle,
            receiver: rx,
        })
    }

    /// Join the group, count the viewer, and announce the new count.
    ///
    /// The returned guard owns the connection from the moment it joins its
    /// group, so a task cancelled while the presence store is busy still
    /// leaves the group and releases the viewer.
    pub async fn activate(
        self: &Arc<Self>,
        pending: PendingConnection,
    ) -> (ConnectionGuard, mpsc::Receiver<OutboundMessage>) {
        let PendingConnection { handle, receiver } = pending;
        let guard = ConnectionGuard::new(handle.clone(), Arc::clone(self));

        self.groups.join(handle.clone());
        if self.closing.load(Ordering::SeqCst) {
            if handle.transition(ConnectionState::Connecting, ConnectionState::Closed) {
                self.groups.leave(&handle);
            }
            debug!(conn_id = %handle.id, "Shutting down; connection not activated");
            return (guard, receiver);
        }

        self.presence.add(&handle.topic, &handle.viewer).await;
        if !handle.transition(ConnectionState::Connecting, ConnectionState::Active) {
            // closed by close_all while the store was busy
            self.release_presence(&handle).await;
            return (guard, receiver);
        }
        connections::record_open(&self.metrics);

        info!(
            conn_id = %handle.id,
            topic = %handle.topic,
            viewer = %handle.viewer,
            "Viewer connected"
        );

        self.broadcast_count(&handle.topic).await;
        (guard, receiver)
    }

    /// Admit and activate in one step.
    pub async fn connect(
        self: &Arc<Self>,
        req: ConnectRequest,
    ) -> Result<(ConnectionGuard, mpsc::Receiver<OutboundMessage>), Rejection> {
        let pending = self.admit(req)?;
        Ok(self.activate(pending).await)
    }

    /// Processes an inbound frame from a client.
    pub async fn handle_inbound(&self, handle: &ConnectionHandle, raw_message: &str) {
        if !handle.is_active() {
            return;
        }
        self.metrics.message_received();

        match parse_inbound(raw_message) {
            InboundMessage::Ping => {
                self.metrics.ping();
                if handle.send(OutboundMessage::Pong) {
                    self.metrics.message_sent_count(1);
                }
                self.presence.refresh(&handle.topic, &handle.viewer).await;
                if self.config.rebroadcast_on_ping {
                    self.broadcast_count(&handle.topic).await;
                }
            }
            InboundMessage::Unknown => {
                debug!(conn_id = %handle.id, "Ignoring unrecognized message");
            }
        }
    }

    /// Tear down a connection that is active or still activating, and
    /// announce the new count to the members left behind. Runs at most
    /// once per connection.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        let was_active = handle.transition(ConnectionState::Active, ConnectionState::Closed);
        if !was_active && !handle.transition(ConnectionState::Connecting, ConnectionState::Closed)
        {
            return;
        }

        self.groups.leave(handle);
        self.release_presence(handle).await;
        if was_active {
            connections::record_close(&self.metrics);
        }

        info!(
            conn_id = %handle.id,
            topic = %handle.topic,
            viewer = %handle.viewer,
            connected_secs = (Utc::now() - handle.connected_at).num_seconds(),
            activated = was_active,
            "Viewer disconnected"
        );

        self.broadcast_count(&handle.topic).await;
    }

    async fn release_presence(&self, handle: &ConnectionHandle) {
        // another tab of the same viewer keeps the viewer counted
        if !self.groups.has_viewer(&handle.topic, &handle.viewer) {
            self.presence.remove(&handle.topic, &handle.viewer).await;
        }
    }

    /// Publish the topic's current count to its group.
    pub async fn broadcast_count(&self, topic: &Topic) {
        let count = self.presence.count(topic).await;
        self.metrics.broadcast();
        self.transport
            .publish(topic, &OutboundMessage::CountUpdate { count })
            .await;
    }

    /// Closes all connections. Connections activated afterwards are
    /// closed as soon as they join.
    pub async fn close_all(&self) {
        self.closing.store(true, Ordering::SeqCst);
        let all = self.groups.all_connections();
        for conn in &all {
            self.disconnect(conn).await;
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.groups.connection_count()
    }

    /// Returns the number of topics with live connections.
    pub fn group_count(&self) -> usize {
        self.groups.group_count()
    }

    /// The presence facade.
    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    /// Name of the broadcast transport in use.
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}
