//! Viewer extractors: who is watching, and with what client.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use liveview_realtime::connection::ResolvedViewer;

use crate::state::AppState;

/// Optional `?token=` query parameter.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The resolved viewer of a request.
///
/// Never rejects: a missing or bad token and a missing cookie both end in
/// an anonymous session, minted here if needed.
#[derive(Debug, Clone)]
pub struct Viewer(pub ResolvedViewer);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let resolver = &state.realtime.resolver;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
            .or_else(|| {
                Query::<TokenQuery>::try_from_uri(&parts.uri)
                    .ok()
                    .and_then(|Query(q)| q.token)
            });

        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(resolver.cookie_name())
            .map(|c| c.value().to_string());

        Ok(Viewer(resolver.resolve(token.as_deref(), session.as_deref())))
    }
}

/// The raw `User-Agent` header, if present and printable.
#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserAgent(
            parts
                .headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}
