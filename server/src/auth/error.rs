use hyper::StatusCode;
use thiserror::Error;

use crate::auth::token::TokenError;

/// Failures at the authentication boundary.
///
/// Credential and token failures become 401s with deliberately vague
/// messages; `Internal` becomes a 500 and its detail only reaches the log.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no authentication token presented")]
    MissingToken,

    #[error("token expired")]
    ExpiredToken,

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid credentials",
            Self::MissingToken => "Unauthorized",
            Self::ExpiredToken | Self::InvalidSignature => "Invalid token",
            Self::Internal(_) => "Internal server error",
        }
    }
}
