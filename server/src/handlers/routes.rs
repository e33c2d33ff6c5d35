use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use shared::types::{Collection, JwtClaims};

use crate::auth::{handle_login, handle_logout};
use crate::handlers::directory;
use crate::handlers::utils::*;
use crate::{AppState, RequestBody, ResponseBody};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two tiers:
//
//   OpenHandler   : no auth.  Receives (req, state).
//                   Use for: login, logout, health, public listings.
//
//   AdminHandler  : claims already verified by the admin gate layer.
//                   Receives (req, state, claims).
//                   Use for: everything under the admin prefix.

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<ResponseBody>>> + Send>>;

type OpenHandler = Box<dyn Fn(Request<RequestBody>, AppState) -> HandlerFuture + Send + Sync>;

type AdminHandler =
    Box<dyn Fn(Request<RequestBody>, AppState, JwtClaims) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(OpenHandler),

    /// Requires the `JwtClaims` the gate leaves in the request extensions.
    /// If the gate was bypassed (misconfigured prefix) the router answers 401
    /// itself rather than run the handler unauthenticated.
    Admin(AdminHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn admin<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Admin(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    /// POST with no authentication. Use only for login / logout.
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Admin (claims from the gate) ──────────────────────────────────────────

    pub fn get_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.admin(Method::GET, path, handler)
    }

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.admin(Method::POST, path, handler)
    }

    pub fn put_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.admin(Method::PUT, path, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<RequestBody>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<ResponseBody>>> + Send + 'static,
    {
        self.admin(Method::DELETE, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<RequestBody>,
        state: AppState,
    ) -> Result<Response<ResponseBody>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Admin(h) => match req.extensions().get::<JwtClaims>().cloned() {
                    Some(claims) => h(req, state, claims).await,
                    None => {
                        warn!("Admin route {} {} reached without claims", method, path);
                        deliver_error_json("Unauthorized", StatusCode::UNAUTHORIZED)
                            .context("Failed to deliver 401 response")
                    }
                },
            };
        }

        debug!("No route for {} {}", method, path);
        deliver_error_json("Not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| r.starts_with(':') || r == p)
    }
}

// ---------------------------------------------------------------------------
// Portal router
//
//   /api/auth/login, /api/auth/logout   → Open
//   /health                             → Open
//   /api/<collection>                   → Open, read-only listing
//   <admin_prefix>/<collection>         → Admin, full CRUD
// ---------------------------------------------------------------------------

pub fn build_router(admin_prefix: &str) -> Router {
    let admin_prefix = admin_prefix.trim_end_matches('/');

    let mut router = Router::new()
        .post("/api/auth/login", |req, state| async move {
            handle_login(req, state).await.context("Login failed")
        })
        .post("/api/auth/logout", |req, state| async move {
            handle_logout(req, state).await.context("Logout failed")
        })
        .get("/health", |_req, _state| async move {
            deliver_serialized_json(&serde_json::json!({ "status": "ok" }), StatusCode::OK)
        });

    for collection in Collection::ALL {
        let public = format!("/api/{}", collection.name());
        let admin = format!("{}/{}", admin_prefix, collection.name());

        router = router
            .get(&public, move |req, state| async move {
                directory::handle_public_list(req, state, collection).await
            })
            .get_admin(&admin, move |req, state, _claims| async move {
                directory::handle_list(req, state, collection).await
            })
            .post_admin(&admin, move |req, state, claims| async move {
                directory::handle_create(req, state, claims, collection).await
            })
            .put_admin(&admin, move |req, state, claims| async move {
                directory::handle_update(req, state, claims, collection).await
            })
            .delete_admin(&admin, move |req, state, claims| async move {
                directory::handle_delete(req, state, claims, collection).await
            });
    }

    router
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_matches() {
        assert!(Router::path_matches("/api/locations", "/api/locations"));
    }

    #[test]
    fn different_paths_do_not_match() {
        assert!(!Router::path_matches("/api/locations", "/api/teachers"));
    }

    #[test]
    fn trailing_slash_does_not_match_without_slash() {
        assert!(!Router::path_matches("/api/locations", "/api/locations/"));
    }

    #[test]
    fn wildcard_segment_matches_id() {
        assert!(Router::path_matches("/api/admin/teachers/:id", "/api/admin/teachers/42"));
    }

    #[test]
    fn wildcard_does_not_match_extra_segments() {
        assert!(!Router::path_matches("/api/admin/:c", "/api/admin/teachers/42"));
    }

    #[test]
    fn query_string_stripped_before_match() {
        assert!(Router::path_matches(
            "/api/admin/locations",
            "/api/admin/locations?id=abc"
        ));
    }

    #[test]
    fn router_new_has_no_routes() {
        assert!(Router::new().routes.is_empty());
    }

    #[test]
    fn portal_router_registers_every_collection() {
        let router = build_router("/api/admin");
        // login, logout, health + (public GET + 4 admin) per collection
        assert_eq!(router.routes.len(), 3 + 5 * Collection::ALL.len());

        let admin_routes = router
            .routes
            .iter()
            .filter(|r| matches!(r.kind, RouteKind::Admin(_)))
            .count();
        assert_eq!(admin_routes, 4 * Collection::ALL.len());
        assert!(
            router
                .routes
                .iter()
                .filter(|r| matches!(r.kind, RouteKind::Admin(_)))
                .all(|r| r.path.starts_with("/api/admin/"))
        );
    }

    #[test]
    fn custom_prefix_is_respected() {
        let router = build_router("/manage/");
        assert!(
            router
                .routes
                .iter()
                .any(|r| r.path == "/manage/teachers" && r.method == Method::DELETE)
        );
    }
}
