use serde::{Deserialize, Serialize};

use crate::types::user::Role;

/// Claims embedded in every JWT issued at login.
///
/// The token is the whole session: the server keeps no session table, so
/// everything the admin gate needs to accept a request lives here and is
/// covered by the HMAC signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// Credential record id.
    #[serde(rename = "userId")]
    pub user_id: String,

    pub username: String,

    /// Carried for handlers that want finer authorisation; the gate itself
    /// only checks authenticity and expiry.
    pub role: Role,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: u64,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: u64,
}
