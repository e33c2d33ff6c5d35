use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service as HyperService;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt, service_fn};
use tracing::{debug, error, info, warn};

use shared::types::server_config::AppConfig;

use crate::auth::AdminGateLayer;
use crate::database;
use crate::handlers::utils::internal_error;
use crate::handlers::{Router, build_router};
use crate::tower_middle::{TimeoutLayer, cors_layer};
use crate::{AppState, BoxError, RequestBody, ResponseBody};

pub type PortalService = BoxCloneService<Request<RequestBody>, Response<ResponseBody>, Infallible>;

/// Route one request, turning handler errors into a logged 500.
async fn dispatch(
    router: &Router,
    req: Request<RequestBody>,
    state: AppState,
) -> Response<ResponseBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match router.route(req, state).await {
        Ok(response) => {
            debug!("{} {} -> {}", method, path, response.status());
            response
        }
        Err(e) => {
            error!("{} {} failed: {:#}", method, path, e);
            internal_error()
        }
    }
}

/// The full middleware stack around the router:
/// CORS → timeout → admin gate → router.
pub fn build_service(state: AppState) -> PortalService {
    let router = Arc::new(build_router(&state.config.auth.admin_prefix));
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let cors = cors_layer(&state.config.cors);
    let gate = AdminGateLayer::new(&state.config.auth.admin_prefix, state.tokens.clone());

    let routes = service_fn(move |req: Request<RequestBody>| {
        let router = router.clone();
        let state = state.clone();
        async move { Ok::<_, Infallible>(dispatch(&router, req, state).await) }
    });

    let svc = ServiceBuilder::new()
        .layer(cors)
        .layer(TimeoutLayer::new(timeout))
        .layer(gate)
        .service(routes);

    BoxCloneService::new(svc)
}

/// Per-connection hyper service in front of the tower stack. Hyper hands us
/// `Incoming` bodies; they are boxed into `RequestBody` here and each request
/// runs on its own clone of the stack.
#[derive(Clone)]
pub struct PortalConnection {
    inner: PortalService,
}

impl PortalConnection {
    pub fn new(inner: PortalService) -> Self {
        Self { inner }
    }
}

fn box_body_error(e: hyper::Error) -> BoxError {
    Box::new(e)
}

impl HyperService<Request<Incoming>> for PortalConnection {
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let req = req.map(|body| body.map_err(box_body_error).boxed_unsync());
        Box::pin(self.inner.clone().oneshot(req))
    }
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, service: PortalService, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let connection = PortalConnection::new(service.clone());

                tokio::task::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(TokioIo::new(stream), connection)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, closing listener");
                break;
            }
        }
    }
}

/// Connect the database, build the service and serve until ctrl-c.
pub async fn serve(config: AppConfig) -> Result<()> {
    let db = database::connect(&config.database.url, config.database.max_connections).await?;
    let addr = config.server.addr();
    let state = AppState::new(config, db)?;

    let service = build_service(state);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Campus portal listening on http://{}", addr);

    serve_on(listener, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
        }
    })
    .await;

    Ok(())
}
