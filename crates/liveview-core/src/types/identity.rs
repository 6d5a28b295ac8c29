//! Viewer identities used as presence set members.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key distinguishing one viewer from another.
///
/// Authenticated viewers are keyed by user id so that several tabs or
/// devices count once; anonymous viewers are keyed by their session token,
/// which survives page reloads within the same browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ViewerIdentity {
    /// A logged-in customer.
    User(String),
    /// An anonymous visitor with a session cookie.
    Session(String),
}

impl ViewerIdentity {
    /// The member string stored in the presence set.
    ///
    /// The kind prefix keeps a user id from colliding with a session token.
    pub fn member_key(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Session(token) => format!("session:{token}"),
        }
    }
}

impl fmt::Display for ViewerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.member_key())
    }
}
