//! Axum wiring: every path and method lands in [`ProxyHandler`], which does
//! its own classification.
use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::Request,
    middleware,
    response::Response,
    routing::{MethodRouter, any},
};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::adapters::{
    http_handler::ProxyHandler,
    middleware::{request_id_middleware, request_timing_middleware},
};

fn make_request_route(handler: Arc<ProxyHandler>) -> MethodRouter {
    any(move |req: Request| {
        let handler = handler.clone();
        async move {
            match handler.handle_request(req).await {
                Ok(response) => Ok::<Response<Body>, Infallible>(response),
                Err(e) => {
                    tracing::error!("Request handling error: {:?}", e);
                    let error_response = Response::builder()
                        .status(500)
                        .body(Body::from("Internal Server Error"))
                        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")));
                    Ok(error_response)
                }
            }
        }
    })
}

/// Build the application router around a handler.
pub fn build_router(handler: Arc<ProxyHandler>) -> Router {
    Router::new()
        .route("/{*path}", make_request_route(handler.clone()))
        .route("/", make_request_route(handler))
        .layer(middleware::from_fn(request_timing_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr().context("Failed to get local addr")?;
    tracing::info!("Taproom listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
