//! `ProductTopic` extractor: the `{id}` path segment as a presence topic.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use liveview_core::error::AppError;
use liveview_core::types::Topic;

use crate::error::ApiError;

/// Topic of the product named in the path. Non-numeric ids are a 404.
#[derive(Debug, Clone)]
pub struct ProductTopic(pub Topic);

impl<S> FromRequestParts<S> for ProductTopic
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("Unknown product"))?;
        Ok(ProductTopic(Topic::from_product_segment(&id)?))
    }
}
