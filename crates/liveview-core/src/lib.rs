//! # liveview-core
//!
//! Core crate for storefront live viewers. Contains the presence store
//! trait, configuration schemas, topic and viewer identifiers, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
