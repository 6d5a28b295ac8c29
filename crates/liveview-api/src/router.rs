//! Route definitions.
//!
//! The product stream lives at `/ws/product/{id}/`; operational endpoints
//! are mounted under `/api`.

use axum::Router;
use axum::routing::get;

use crate::handlers;
use crate::state::AppState;

/// Build the router and thread `AppState` through every route.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(health_routes());

    let ws_routes = Router::new().route("/ws/product/{id}/", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
