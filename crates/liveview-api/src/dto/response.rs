//! Response DTOs.

use serde::{Deserialize, Serialize};

use liveview_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

/// Operational detail for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// `ok`, or `degraded` once presence has fallen back to memory or the
    /// active backend fails its health check.
    pub status: String,
    /// Presence backend answering calls (`redis` or `fallback`).
    pub presence_backend: String,
    /// Whether the active presence backend answered its health check.
    pub presence_reachable: bool,
    /// Broadcast transport (`local` or `redis`).
    pub broadcast_transport: String,
    /// Live WebSocket connections in this process.
    pub connections: usize,
    /// Topics with at least one live connection.
    pub groups: usize,
    /// Realtime counters.
    pub metrics: MetricsSnapshot,
}
