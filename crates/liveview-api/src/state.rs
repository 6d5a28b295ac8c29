//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use liveview_core::config::AppConfig;
use liveview_realtime::RealtimeEngine;

/// Application state passed to every handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Creates the state for a freshly started engine.
    pub fn new(config: Arc<AppConfig>, realtime: Arc<RealtimeEngine>) -> Self {
        Self {
            config,
            realtime,
            started_at: Instant::now(),
        }
    }
}
