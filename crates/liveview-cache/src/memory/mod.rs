//! In-process presence fallback.

pub mod store;

pub use store::MemoryPresenceStore;
