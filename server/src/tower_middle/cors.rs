use std::time::Duration;

use http::Method;
use http::header::{self, HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use shared::types::server_config::CorsConfig;

/// CORS for every response. An empty origin list allows any origin; an
/// explicit list also allows credentials so the auth cookie is sent.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    if config.allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(origins).allow_credentials(true)
}
