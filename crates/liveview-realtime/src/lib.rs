//! # liveview-realtime
//!
//! Real-time engine behind the "N people are viewing this product" badge.
//! Provides:
//!
//! - Viewer identity resolution (access token or anonymous session)
//! - Crawler filtering before any state is touched
//! - Per-topic broadcast groups with local and Redis pub/sub fan-out
//! - The connect / keepalive / disconnect lifecycle that keeps the
//!   presence store and the broadcast groups in step

pub mod bridge;
pub mod channel;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod server;

pub use channel::registry::GroupRegistry;
pub use connection::manager::ConnectionManager;
pub use server::RealtimeEngine;
