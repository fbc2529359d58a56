//! Axum middleware attached to every route.
//!
//! Both layers are stateless: one tags the request with an id that is echoed
//! in `X-Request-ID`, the other logs start/end and latency.
use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generate a per‑request UUID and expose it via tracing plus `X-Request-ID`.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        http.method = %req.method(),
        http.path = %req.uri().path(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, header_value);
    }

    response
}

/// Log start/end of a request including latency.
pub async fn request_timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let has_origin = req.headers().contains_key(axum::http::header::ORIGIN);

    tracing::debug!("Started processing {} {}", method, uri);

    let response = next.run(req).await;
    let duration = start.elapsed();

    tracing::info!(
        http.method = %method,
        http.uri = %uri,
        http.status_code = response.status().as_u16(),
        cors = has_origin,
        duration_ms = duration.as_millis() as u64,
        "Completed request"
    );

    response
}
