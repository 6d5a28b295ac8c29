//! Core traits defined in `liveview-core` and implemented by other crates.

pub mod presence;

pub use presence::PresenceStore;
