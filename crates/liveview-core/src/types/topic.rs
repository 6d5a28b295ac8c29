//! Topics scope presence sets and broadcast groups.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The subject being watched, e.g. one product page.
///
/// A topic is fixed for the lifetime of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Topic for a product detail page.
    pub fn product(product_id: u64) -> Self {
        Self(format!("product:{product_id}"))
    }

    /// Parse the product id path segment used by the websocket route.
    ///
    /// Only plain decimal ids are accepted.
    pub fn from_product_segment(segment: &str) -> Result<Self, AppError> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::not_found(format!("Unknown product '{segment}'")));
        }
        segment
            .parse::<u64>()
            .map(Self::product)
            .map_err(|_| AppError::not_found(format!("Unknown product '{segment}'")))
    }

    /// Returns the topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(name)
    }
}
