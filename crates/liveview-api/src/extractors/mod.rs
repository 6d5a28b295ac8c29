//! Custom Axum extractors.

pub mod product;
pub mod viewer;

pub use product::ProductTopic;
pub use viewer::{UserAgent, Viewer};
