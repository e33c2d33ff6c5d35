use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper::header::{ALLOW, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::ResponseBody;
use crate::auth::error::AuthError;
use crate::auth::token::TokenCodec;
use crate::handlers::utils::{add_cors_headers, error_response, extract_auth_token, full};

/// Tower layer guarding every path under the admin prefix.
///
/// Requests outside the prefix pass straight through. Requests inside it
/// must present a valid token (cookie or Bearer); the decoded `JwtClaims`
/// is then placed in the request extensions for the handler.
#[derive(Clone)]
pub struct AdminGateLayer {
    prefix: Arc<str>,
    tokens: Arc<TokenCodec>,
}

impl AdminGateLayer {
    pub fn new(prefix: &str, tokens: Arc<TokenCodec>) -> Self {
        Self {
            prefix: Arc::from(prefix.trim_end_matches('/')),
            tokens,
        }
    }
}

impl<S> Layer<S> for AdminGateLayer {
    type Service = AdminGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminGateService {
            inner,
            prefix: self.prefix.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AdminGateService<S> {
    inner: S,
    prefix: Arc<str>,
    tokens: Arc<TokenCodec>,
}

/// `/api/admin` and `/api/admin/...` are guarded; `/api/administrator` is not.
pub fn is_guarded(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn denial(error: &AuthError) -> Response<ResponseBody> {
    let mut response = error_response(error.client_message(), error.status());
    add_cors_headers(response.headers_mut());
    response
}

fn preflight() -> Response<ResponseBody> {
    let mut response = Response::new(full(""));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(
        ALLOW,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    add_cors_headers(response.headers_mut());
    response
}

impl<S, ReqBody> Service<Request<ReqBody>> for AdminGateService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResponseBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();

        if !is_guarded(&self.prefix, req.uri().path()) {
            return Box::pin(async move { inner.call(req).await });
        }

        if req.method() == Method::OPTIONS {
            return Box::pin(async move { Ok(preflight()) });
        }

        let Some(token) = extract_auth_token(req.headers()) else {
            warn!("Admin gate: no token for {} {}", req.method(), req.uri().path());
            return Box::pin(async move { Ok(denial(&AuthError::MissingToken)) });
        };

        match self.tokens.verify(&token) {
            Ok(claims) => {
                debug!(
                    "Admin gate: {} ({}) -> {} {}",
                    claims.username,
                    claims.role,
                    req.method(),
                    req.uri().path()
                );
                req.extensions_mut().insert(claims);
                Box::pin(async move { inner.call(req).await })
            }
            Err(e) => {
                let error = AuthError::from(e);
                warn!(
                    "Admin gate: rejected {} {}: {}",
                    req.method(),
                    req.uri().path(),
                    error
                );
                Box::pin(async move { Ok(denial(&error)) })
            }
        }
    }
}
