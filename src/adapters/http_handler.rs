use std::{sync::Arc, time::Duration};

use axum::{
    body::Body as AxumBody,
    http::{HeaderValue, StatusCode, header},
};
use eyre::{Result, WrapErr};
use hyper::{Request, Response};

use crate::{
    config::ServerConfig,
    core::{
        ApiError, BeverageTypeListing, CorsPolicy, FestivalRegistry, Route, RouteTable,
        cors::strip_cors_grant,
    },
    ports::http_client::{HttpClient, HttpClientError},
};

pub const CACHE_CONTROL_REGISTRY: &str = "no-cache, must-revalidate";
pub const CACHE_CONTROL_BEVERAGE_TYPES: &str = "public, max-age=3600";

/// HTTP handler for the festival data proxy.
///
/// Holds only immutable state, so one instance serves every request
/// concurrently.
pub struct ProxyHandler {
    routes: RouteTable,
    cors: CorsPolicy,
    registry: Arc<FestivalRegistry>,
    http_client: Arc<dyn HttpClient>,
    upstream_base: String,
    upstream_timeout_secs: u64,
    max_listing_bytes: usize,
}

impl ProxyHandler {
    pub fn new(
        config: &ServerConfig,
        registry: Arc<FestivalRegistry>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            routes: RouteTable::standard(),
            cors: CorsPolicy::from_config(&config.cors),
            registry,
            http_client,
            upstream_base: config.upstream.base_url().to_string(),
            upstream_timeout_secs: config.upstream.timeout_secs,
            max_listing_bytes: config.upstream.max_listing_bytes,
        }
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Main request handler that routes requests appropriately
    pub async fn handle_request(&self, req: Request<AxumBody>) -> Result<Response<AxumBody>> {
        let origin = req.headers().get(header::ORIGIN).cloned();
        let route = self.routes.classify(req.method(), req.uri().path());

        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            route = route.name(),
            "Classified request"
        );

        match route {
            Route::Preflight => self.handle_preflight(origin.as_ref()),
            Route::Health => self.handle_health_check(origin.as_ref()),
            Route::FestivalRegistry => self.handle_festival_registry(origin.as_ref()),
            Route::BeverageTypes { festival_id } => {
                self.handle_beverage_types(&festival_id, origin.as_ref())
                    .await
            }
            Route::Passthrough => self.handle_passthrough(req, origin.as_ref()).await,
        }
    }

    /// Handle a CORS preflight: 204 with the method/header grants.
    fn handle_preflight(&self, origin: Option<&HeaderValue>) -> Result<Response<AxumBody>> {
        let mut response = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(AxumBody::empty())
            .wrap_err("Failed to build preflight response")?;
        response
            .headers_mut()
            .extend(self.cors.preflight_headers(origin));
        Ok(response)
    }

    /// Handle health check endpoint
    fn handle_health_check(&self, origin: Option<&HeaderValue>) -> Result<Response<AxumBody>> {
        let body = serde_json::json!({ "status": "ok" });
        self.json_response(StatusCode::OK, body.to_string(), None, origin)
            .wrap_err("Failed to build health check response")
    }

    /// Serve the registry document verbatim.
    fn handle_festival_registry(
        &self,
        origin: Option<&HeaderValue>,
    ) -> Result<Response<AxumBody>> {
        self.json_response(
            StatusCode::OK,
            self.registry.raw_json(),
            Some(CACHE_CONTROL_REGISTRY),
            origin,
        )
        .wrap_err("Failed to build festival registry response")
    }

    async fn handle_beverage_types(
        &self,
        festival_id: &str,
        origin: Option<&HeaderValue>,
    ) -> Result<Response<AxumBody>> {
        match self.discover_beverage_types(festival_id).await {
            Ok(listing) => {
                tracing::debug!(
                    festival_id = %festival_id,
                    count = listing.available_beverage_types.len(),
                    "Discovered beverage types"
                );
                let body = serde_json::to_string(&listing)
                    .wrap_err("Failed to serialize beverage type listing")?;
                self.json_response(
                    StatusCode::OK,
                    body,
                    Some(CACHE_CONTROL_BEVERAGE_TYPES),
                    origin,
                )
                .wrap_err("Failed to build beverage types response")
            }
            Err(e) => self.error_response(&e, origin),
        }
    }

    /// Determine the beverage types of a festival from the upstream's
    /// directory index page.
    ///
    /// A non-2xx index response means the festival is unknown upstream. Any
    /// transport or read failure is a discovery failure. The upstream timeout
    /// bounds the fetch and the body read together.
    pub async fn discover_beverage_types(
        &self,
        festival_id: &str,
    ) -> Result<BeverageTypeListing, ApiError> {
        let budget = Duration::from_secs(self.upstream_timeout_secs);
        match tokio::time::timeout(budget, self.fetch_listing(festival_id)).await {
            Ok(result) => result,
            Err(_) => {
                let e = HttpClientError::Timeout(self.upstream_timeout_secs);
                tracing::error!(festival_id = %festival_id, error = %e, "Directory listing fetch stalled");
                Err(ApiError::discovery(e.to_string()))
            }
        }
    }

    async fn fetch_listing(&self, festival_id: &str) -> Result<BeverageTypeListing, ApiError> {
        let url = format!("{}/{}/", self.upstream_base, festival_id);
        let req = Request::builder()
            .method("GET")
            .uri(&url)
            .body(AxumBody::empty())
            .map_err(|e| ApiError::discovery(e.to_string()))?;

        let response = self.http_client.send_request(req).await.map_err(|e| {
            tracing::error!(festival_id = %festival_id, error = %e, "Directory listing fetch failed");
            ApiError::discovery(e.to_string())
        })?;

        if !response.status().is_success() {
            tracing::info!(
                festival_id = %festival_id,
                status = response.status().as_u16(),
                "Upstream has no directory for festival"
            );
            return Err(ApiError::festival_not_found(festival_id));
        }

        let bytes = axum::body::to_bytes(response.into_body(), self.max_listing_bytes)
            .await
            .map_err(|e| {
                tracing::error!(festival_id = %festival_id, error = %e, "Failed to read directory listing");
                ApiError::discovery(e.to_string())
            })?;
        let html = String::from_utf8_lossy(&bytes);

        Ok(BeverageTypeListing::from_listing(festival_id, &html))
    }

    /// Forward the request upstream and relay the response with the local
    /// CORS decision applied.
    async fn handle_passthrough(
        &self,
        req: Request<AxumBody>,
        origin: Option<&HeaderValue>,
    ) -> Result<Response<AxumBody>> {
        let upstream_req = match self.build_upstream_request(&req) {
            Ok(r) => r,
            Err(e) => return self.error_response(&e, origin),
        };

        match self.http_client.send_request(upstream_req).await {
            Ok(mut response) => {
                let headers = response.headers_mut();
                strip_cors_grant(headers);
                self.cors.apply(origin, headers);
                Ok(response)
            }
            Err(e) => {
                tracing::error!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error = %e,
                    "Upstream request failed"
                );
                self.error_response(&ApiError::proxy(e.to_string()), origin)
            }
        }
    }

    /// Upstream request carrying only the caller's method, path and query.
    /// Caller headers (including `Origin`) and body are not forwarded.
    fn build_upstream_request(
        &self,
        req: &Request<AxumBody>,
    ) -> Result<Request<AxumBody>, ApiError> {
        let path_and_query = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path(), |pq| pq.as_str());
        let url = format!("{}{}", self.upstream_base, path_and_query);

        Request::builder()
            .method(req.method().clone())
            .uri(&url)
            .body(AxumBody::empty())
            .map_err(|e| ApiError::proxy(e.to_string()))
    }

    fn error_response(
        &self,
        error: &ApiError,
        origin: Option<&HeaderValue>,
    ) -> Result<Response<AxumBody>> {
        self.json_response(error.status(), error.body().to_string(), None, origin)
            .wrap_err("Failed to build error response")
    }

    fn json_response(
        &self,
        status: StatusCode,
        body: impl Into<AxumBody>,
        cache_control: Option<&'static str>,
        origin: Option<&HeaderValue>,
    ) -> Result<Response<AxumBody>, http::Error> {
        let mut builder = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cache_control) = cache_control {
            builder = builder.header(header::CACHE_CONTROL, cache_control);
        }
        let mut response = builder.body(body.into())?;
        self.cors.apply(origin, response.headers_mut());
        Ok(response)
    }
}

impl Clone for ProxyHandler {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            cors: self.cors.clone(),
            registry: self.registry.clone(),
            http_client: self.http_client.clone(),
            upstream_base: self.upstream_base.clone(),
            upstream_timeout_secs: self.upstream_timeout_secs,
            max_listing_bytes: self.max_listing_bytes,
        }
    }
}
