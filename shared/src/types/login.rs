use serde::{Deserialize, Serialize};

use crate::types::user::UserSummary;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// `POST /api/auth/login` body. Missing fields deserialize as empty strings
/// so they can be reported as a validation error instead of a parse error.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginData {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

/// Successful login envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    /// Signed JWT string, also set as the `auth-token` cookie.
    pub token: String,
    pub user: UserSummary,
}

impl LoginResponse {
    pub fn new(token: String, user: UserSummary) -> Self {
        Self {
            success: true,
            token,
            user,
        }
    }
}
