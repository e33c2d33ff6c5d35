//! JWT issuance and verification.
//!
//! Tokens are HS256-signed over the full claims payload. Verification is
//! self-contained: the signing secret is the only state needed, so no store is
//! consulted and no revocation list exists. A leaked token stays valid until
//! its `exp`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;

use shared::types::{JwtClaims, Role};

/// Fixed token lifetime.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    /// Tampered payload, wrong secret or malformed input.
    #[error("token signature invalid")]
    InvalidSignature,
}

/// Who a token is issued to.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// Signs and verifies login tokens with one injected secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: TOKEN_TTL,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, valid from now for the codec TTL.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String> {
        self.issue_at(subject, unix_now())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    /// Identical inputs produce identical tokens.
    pub fn issue_at(&self, subject: &TokenSubject, now: u64) -> Result<String> {
        let claims = JwtClaims {
            user_id: subject.user_id.clone(),
            username: subject.username.clone(),
            role: subject.role,
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        debug!(
            "Issuing token for {} ({}), expires at {}",
            claims.username, claims.user_id, claims.exp
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign token")
    }

    /// Check signature and expiry and return the embedded claims.
    ///
    /// A token is expired from the second `exp` is reached; jsonwebtoken only
    /// rejects `exp < now`, so the boundary is checked here after the
    /// signature has been accepted.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        let claims = decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    debug!("Token rejected: {}", e);
                    TokenError::InvalidSignature
                }
            })?;

        if claims.exp <= unix_now() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
