//! Connection lifecycle counters.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record an admitted connection
pub fn record_open(metrics: &RealtimeMetrics) {
    metrics.connections_total.fetch_add(1, Ordering::Relaxed);
    metrics.connections_active.fetch_add(1, Ordering::Relaxed);
}

/// Record a disconnection
pub fn record_close(metrics: &RealtimeMetrics) {
    metrics.connections_active.fetch_sub(1, Ordering::Relaxed);
}

/// Record a crawler rejected before upgrade
pub fn record_bot_rejected(metrics: &RealtimeMetrics) {
    metrics.bots_rejected.fetch_add(1, Ordering::Relaxed);
}
