//! Per-topic broadcast groups.

pub mod channel;
pub mod registry;

pub use channel::Group;
pub use registry::GroupRegistry;
