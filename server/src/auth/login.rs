use anyhow::{Context, Result, anyhow};
use http_body_util::BodyExt;
use hyper::header::SET_COOKIE;
use hyper::{Request, Response, StatusCode};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use shared::types::{LoginData, LoginResponse, UserSummary};

use crate::auth::error::AuthError;
use crate::auth::password::{verify_dummy_password, verify_password};
use crate::auth::token::{TokenCodec, TokenSubject};
use crate::database::find_by_username;
use crate::handlers::utils::{create_auth_cookie, deliver_error_json, deliver_serialized_json};
use crate::{AppState, RequestBody, ResponseBody};

/// Check a username/password pair and issue a token for it.
///
/// An unknown username and a wrong password both come back as
/// `InvalidCredentials`, after the same amount of hashing work.
pub async fn authenticate(
    pool: &SqlitePool,
    tokens: &TokenCodec,
    username: &str,
    password: &str,
) -> Result<(String, UserSummary), AuthError> {
    let Some(record) = find_by_username(pool, username).await? else {
        verify_dummy_password(password);
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&record.password_hash, password)? {
        return Err(AuthError::InvalidCredentials);
    }

    let token = tokens.issue(&TokenSubject {
        user_id: record.id.clone(),
        username: record.username.clone(),
        role: record.role,
    })?;

    Ok((token, record.summary()))
}

async fn parse_login_body(req: Request<RequestBody>) -> Result<LoginData> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read login body: {}", e))?
        .to_bytes();

    serde_json::from_slice(&bytes).context("Failed to parse login body")
}

/// `POST /api/auth/login`
pub async fn handle_login(req: Request<RequestBody>, state: AppState) -> Result<Response<ResponseBody>> {
    let login_data = match parse_login_body(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Login rejected: {:#}", e);
            return deliver_error_json("Invalid request body", StatusCode::BAD_REQUEST);
        }
    };

    if !login_data.is_complete() {
        return deliver_error_json(
            "Username and password are required",
            StatusCode::BAD_REQUEST,
        );
    }

    match authenticate(
        &state.db,
        &state.tokens,
        &login_data.username,
        &login_data.password,
    )
    .await
    {
        Ok((token, user)) => {
            info!("User logged in: {} ({})", user.username, user.role);

            let cookie = create_auth_cookie(&token, state.config.server.tls)
                .context("Failed to create auth cookie")?;

            let mut response =
                deliver_serialized_json(&LoginResponse::new(token, user), StatusCode::OK)?;
            response.headers_mut().insert(SET_COOKIE, cookie);
            Ok(response)
        }
        Err(AuthError::Internal(e)) => {
            error!("Login failed for {}: {:#}", login_data.username, e);
            deliver_error_json(
                "An error occurred during login",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
        Err(e) => {
            warn!("Login failed for {}: {}", login_data.username, e);
            deliver_error_json(e.client_message(), e.status())
        }
    }
}
