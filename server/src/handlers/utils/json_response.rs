use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use shared::types::ErrorResponse;

use crate::ResponseBody;

/// Wrap bytes in the boxed response body used across the server.
pub fn full<T: Into<Bytes>>(chunk: T) -> ResponseBody {
    Full::new(chunk.into()).boxed()
}

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<ResponseBody>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(json))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))?;

    Ok(response)
}

/// Delivers a `{"error": message}` response with the given status.
pub fn deliver_error_json(message: &str, status: StatusCode) -> Result<Response<ResponseBody>> {
    if status.is_server_error() {
        error!("Delivering error JSON: {} ({})", status.as_u16(), message);
    } else {
        debug!("Delivering error JSON: {} ({})", status.as_u16(), message);
    }

    deliver_serialized_json(&ErrorResponse::new(message), status)
}

/// Infallible variant of [`deliver_error_json`] for middleware, which has no
/// error channel to report a response-building failure through.
pub fn error_response(message: &str, status: StatusCode) -> Response<ResponseBody> {
    let body = serde_json::to_vec(&ErrorResponse::new(message))
        .unwrap_or_else(|_| br#"{"error":"Internal server error"}"#.to_vec());

    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Generic 500 used when a handler bubbles up an unexpected error.
pub fn internal_error() -> Response<ResponseBody> {
    error_response("Internal server error", StatusCode::INTERNAL_SERVER_ERROR)
}
