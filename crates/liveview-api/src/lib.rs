//! # liveview-api
//!
//! HTTP layer for storefront live viewers built on Axum.
//!
//! Provides the product WebSocket endpoint, health endpoints, CORS and
//! request tracing, the viewer extractors, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
