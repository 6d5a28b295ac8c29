//! Realtime engine metrics.

pub mod connections;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections admitted
    pub connections_total: AtomicU64,
    /// Connections currently active
    pub connections_active: AtomicU64,
    /// Upgrade requests refused as crawlers
    pub bots_rejected: AtomicU64,
    /// Frames received from clients
    pub messages_received: AtomicU64,
    /// Messages handed to client send buffers
    pub messages_sent: AtomicU64,
    /// Keepalive pings handled
    pub pings: AtomicU64,
    /// Count updates published
    pub broadcasts: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one inbound frame
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` delivered messages
    pub fn message_sent_count(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a handled ping
    pub fn ping(&self) {
        self.pings.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a published count update
    pub fn broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            bots_rejected: self.bots_rejected.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            pings: self.pings.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections admitted
    pub connections_total: u64,
    /// Connections currently active
    pub connections_active: u64,
    /// Upgrade requests refused as crawlers
    pub bots_rejected: u64,
    /// Frames received from clients
    pub messages_received: u64,
    /// Messages handed to client send buffers
    pub messages_sent: u64,
    /// Keepalive pings handled
    pub pings: u64,
    /// Count updates published
    pub broadcasts: u64,
}
