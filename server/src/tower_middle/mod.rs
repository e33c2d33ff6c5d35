/// Tower middleware module
///
/// Layers wrapped around the router, outermost first:
/// - CORS (tower-http)
/// - Request timeouts
///
/// The admin gate lives in `crate::auth::gate`.
pub mod cors;
pub mod tower_timeout_handler;

pub use cors::cors_layer;
pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
