pub mod app;
pub mod auth;
pub mod cli;
pub mod database;
pub mod handlers;
pub mod tower_middle;

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use bytes::Bytes;
use http_body_util::combinators::{BoxBody, UnsyncBoxBody};
use http_body_util::{BodyExt, Full};
use sqlx::SqlitePool;

use shared::config::MIN_SECRET_LEN;
use shared::types::server_config::AppConfig;

use crate::auth::TokenCodec;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body seen by the middleware stack and handlers. Hyper's
/// `Incoming` is boxed into this at the connection edge.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

pub type ResponseBody = BoxBody<Bytes, Infallible>;

/// Build a request body from in-memory bytes.
pub fn body_from<T: Into<Bytes>>(chunk: T) -> RequestBody {
    Full::new(chunk.into())
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

/// Shared per-server state, cloned into every request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    /// Fails when no signing secret can be resolved.
    pub fn new(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let secret = config
            .auth
            .resolved_jwt_secret()
            .ok_or_else(|| anyhow!("No JWT secret configured (set JWT_SECRET or auth.jwt_secret)"))?;

        if secret.len() < MIN_SECRET_LEN {
            bail!("JWT secret must be at least {} characters", MIN_SECRET_LEN);
        }

        Ok(Self {
            tokens: Arc::new(TokenCodec::new(secret.as_bytes())),
            config: Arc::new(config),
            db,
        })
    }
}
