//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let connections = &state.realtime.connections;
    let presence = connections.presence();

    let presence_reachable = presence.health_check().await;
    // a configured backend that tripped is degraded; memory-only is not
    let status = if presence.availability().is_available() && presence_reachable {
        "ok"
    } else {
        "degraded"
    };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        presence_backend: presence.active_backend().to_string(),
        presence_reachable,
        broadcast_transport: connections.transport_name().to_string(),
        connections: connections.connection_count(),
        groups: connections.group_count(),
        metrics: state.realtime.metrics.snapshot(),
    }))
}
