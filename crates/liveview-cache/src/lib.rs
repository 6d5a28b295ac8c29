//! # liveview-cache
//!
//! Presence store implementations for storefront live viewers:
//!
//! - **redis**: shared presence across every server process, using the
//!   [redis](https://crates.io/crates/redis) crate
//! - **memory**: process-local fallback used when Redis is unreachable
//!
//! [`PresenceManager`] hides which one is active. The first Redis failure
//! trips a [`BackendAvailability`] breaker and every later call goes to
//! the fallback until the process restarts.

pub mod circuit;
pub mod keys;
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use circuit::BackendAvailability;
pub use provider::PresenceManager;
