//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per
//! connection; when a client goes away hyper drops the in-flight handler,
//! which cancels any pending identity, locator or store call with it.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::policy::OriginPolicy;
use crate::routes::{self, MEDIA_PREFIX};
use crate::services::MediaAccessService;
use crate::types::{BoxBody, GatewayError};

/// Shared application state, read-only while serving
pub struct AppState {
    pub args: Args,
    /// Origin allow-list, fixed at startup
    pub policy: OriginPolicy,
    /// Media access decisions
    pub access: MediaAccessService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, access: MediaAccessService) -> Self {
        let policy = args.origin_policy();
        Self {
            args,
            policy,
            access,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn run(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Postern listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure identity secret in use");
    }
    if !state.policy.is_enforcing() {
        warn!("ALLOWED_ORIGINS is empty - CORS enforcement disabled");
    }

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Log and route one request
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, Infallible> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(&state, req).await)
}

/// Route a request to its handler.
///
/// The origin decision is made first so every response, including 404s
/// and errors, carries the CORS header set. Request bodies are never read.
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<BoxBody> {
    let origin = req
        .headers()
        .get(hyper::header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let cors = state.policy.decide(origin);

    let method = req.method();
    let path = req.uri().path();

    match (method, path) {
        (_, p) if p.starts_with(MEDIA_PREFIX) => {
            routes::handle_media_request(state, method, req.uri(), req.headers(), &cors).await
        }

        // Liveness probe
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            routes::health_check(state, &cors)
        }

        // Version info for deployment verification
        (&Method::GET, "/version") => routes::version_info(&cors),

        // Not found
        _ => routes::error_response(&GatewayError::NotFound(path.to_string()), &cors),
    }
}
