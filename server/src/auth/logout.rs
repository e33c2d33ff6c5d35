use anyhow::{Context, Result};
use hyper::header::SET_COOKIE;
use hyper::{Request, Response, StatusCode};
use tracing::info;

use crate::handlers::utils::{delete_auth_cookie, deliver_serialized_json};
use crate::{AppState, RequestBody, ResponseBody};

/// `POST /api/auth/logout`
///
/// Only expires the cookie. The token itself stays valid until `exp`.
pub async fn handle_logout(_req: Request<RequestBody>, state: AppState) -> Result<Response<ResponseBody>> {
    let cookie =
        delete_auth_cookie(state.config.server.tls).context("Failed to create logout cookie")?;

    let mut response =
        deliver_serialized_json(&serde_json::json!({ "success": true }), StatusCode::OK)?;
    response.headers_mut().insert(SET_COOKIE, cookie);

    info!("Auth cookie cleared");
    Ok(response)
}
