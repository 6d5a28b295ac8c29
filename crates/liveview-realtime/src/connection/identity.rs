//! Viewer identity resolution.
//!
//! A logged-in customer is identified by the `sub` claim of their access
//! token. Everyone else is identified by the anonymous session cookie,
//! minted here on first contact. Token problems never block a viewer:
//! they just fall through to the anonymous path.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use liveview_core::config::SessionConfig;
use liveview_core::error::AppError;
use liveview_core::types::ViewerIdentity;

/// Access token claims the resolver relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: u64,
}

/// The identity of a connecting viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedViewer {
    /// Presence key for the viewer.
    pub identity: ViewerIdentity,
    /// Session token minted for this request, to be set as a cookie.
    pub minted_session: Option<String>,
}

/// Resolves viewer identities from tokens and session cookies.
#[derive(Clone)]
pub struct ViewerResolver {
    /// HMAC key; `None` when authenticated viewers are disabled.
    decoding_key: Option<DecodingKey>,
    /// Validation configuration.
    validation: Validation,
    /// Session cookie name.
    cookie_name: String,
}

impl std::fmt::Debug for ViewerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerResolver")
            .field("tokens_enabled", &self.decoding_key.is_some())
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl ViewerResolver {
    /// Creates a resolver from session configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        let decoding_key = (!config.jwt_secret.is_empty())
            .then(|| DecodingKey::from_secret(config.jwt_secret.as_bytes()));

        Self {
            decoding_key,
            validation,
            cookie_name: config.cookie_name.clone(),
        }
    }

    /// Name of the session cookie to read and set.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Validates an access token and returns the user id it names.
    pub fn authenticate(&self, token: &str) -> Result<String, AppError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AppError::authentication("Access tokens are not enabled"))?;

        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::authentication("Token has expired")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AppError::authentication("Invalid token signature")
            }
            _ => AppError::authentication(format!("Token validation failed: {e}")),
        })?;

        if data.claims.sub.is_empty() {
            return Err(AppError::authentication("Token has no subject"));
        }
        Ok(data.claims.sub)
    }

    /// Resolve the viewer for a connection.
    ///
    /// Order: valid access token, then existing session cookie, then a
    /// freshly minted session token.
    pub fn resolve(&self, token: Option<&str>, session: Option<&str>) -> ResolvedViewer {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            match self.authenticate(token) {
                Ok(user_id) => {
                    return ResolvedViewer {
                        identity: ViewerIdentity::User(user_id),
                        minted_session: None,
                    };
                }
                Err(e) => debug!(error = %e, "Ignoring unusable access token"),
            }
        }

        if let Some(session) = session.filter(|s| is_valid_session_token(s)) {
            return ResolvedViewer {
                identity: ViewerIdentity::Session(session.to_string()),
                minted_session: None,
            };
        }

        let minted = Uuid::new_v4().simple().to_string();
        ResolvedViewer {
            identity: ViewerIdentity::Session(minted.clone()),
            minted_session: Some(minted),
        }
    }
}

/// Session tokens are opaque but must be printable and reasonably short.
fn is_valid_session_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 128
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    const SECRET: &str = "test-secret";

    fn resolver() -> ViewerResolver {
        ViewerResolver::new(&SessionConfig {
            jwt_secret: SECRET.to_string(),
            ..SessionConfig::default()
        })
    }

    fn token(sub: &str, exp_offset: i64, secret: &str) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as u64;
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_wins_over_cookie() {
        let viewer = resolver().resolve(Some(&token("17", 600, SECRET)), Some("abc"));
        assert_eq!(viewer.identity, ViewerIdentity::User("17".into()));
        assert_eq!(viewer.minted_session, None);
    }

    #[test]
    fn test_bad_tokens_fall_back_to_session() {
        let resolver = resolver();
        for bad in [
            token("17", 600, "other-secret"),
            token("17", -600, SECRET),
            "garbage".to_string(),
        ] {
            let viewer = resolver.resolve(Some(&bad), Some("abc"));
            assert_eq!(viewer.identity, ViewerIdentity::Session("abc".into()));
        }
    }

    #[test]
    fn test_tokens_ignored_when_disabled() {
        let resolver = ViewerResolver::new(&SessionConfig::default());
        let viewer = resolver.resolve(Some(&token("17", 600, SECRET)), Some("abc"));
        assert_eq!(viewer.identity, ViewerIdentity::Session("abc".into()));
    }

    #[test]
    fn test_session_is_minted_when_missing() {
        let resolver = resolver();
        let first = resolver.resolve(None, None);
        let minted = first.minted_session.clone().unwrap();
        assert_eq!(first.identity, ViewerIdentity::Session(minted.clone()));

        // the browser sends the cookie back on reconnect
        let again = resolver.resolve(None, Some(&minted));
        assert_eq!(again.identity, first.identity);
        assert_eq!(again.minted_session, None);
    }

    #[test]
    fn test_malformed_cookie_is_replaced() {
        let viewer = resolver().resolve(None, Some("bad value;"));
        assert!(viewer.minted_session.is_some());
    }
}
