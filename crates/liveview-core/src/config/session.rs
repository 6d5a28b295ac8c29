//! Viewer session and identity configuration.

use serde::{Deserialize, Serialize};

/// Session cookie and token settings used to identify viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the anonymous session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Max-Age of a freshly minted session cookie, in seconds.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_seconds: u64,
    /// HS256 secret for access tokens. Empty disables authenticated viewers.
    #[serde(default)]
    pub jwt_secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_max_age_seconds: default_cookie_max_age(),
            jwt_secret: String::new(),
        }
    }
}

fn default_cookie_name() -> String {
    "sessionid".to_string()
}

fn default_cookie_max_age() -> u64 {
    // two weeks
    1_209_600
}
