//! Core type definitions used across the workspace.

pub mod identity;
pub mod topic;

pub use identity::ViewerIdentity;
pub use topic::Topic;
