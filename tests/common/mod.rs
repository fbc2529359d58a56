//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, sync::Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use taproom::{
    adapters::{ProxyHandler, build_router},
    config::ServerConfig,
    core::FestivalRegistry,
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
};

pub const UPSTREAM: &str = "https://upstream.test";
pub const APP_ORIGIN: &str = "https://cambeerfestival.app";
pub const PREVIEW_ORIGIN: &str = "https://abc123.cambeerfestival.pages.dev";

/// In-memory upstream keyed by path-and-query. Unknown paths answer 404.
#[derive(Default)]
pub struct MockUpstream {
    pages: HashMap<String, (u16, String)>,
    failure: Option<HttpClientError>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.pages.insert(path.to_string(), (status, body.into()));
        self
    }

    pub fn failing(error: HttpClientError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for MockUpstream {
    async fn send_request(&self, req: Request<Body>) -> HttpClientResult<Response<Body>> {
        let uri = req.uri().clone();
        self.requests
            .lock()
            .unwrap()
            .push((req.method().to_string(), uri.to_string()));

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let key = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
        let (status, body) = self
            .pages
            .get(&key)
            .cloned()
            .unwrap_or((404, "Not Found".to_string()));

        Ok(Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body))
            .unwrap())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig::builder().upstream_origin(UPSTREAM).build()
}

pub fn app(upstream: Arc<MockUpstream>) -> Router {
    let registry = Arc::new(FestivalRegistry::embedded().unwrap());
    build_router(Arc::new(ProxyHandler::new(&test_config(), registry, upstream)))
}

pub fn get(uri: &str, origin: Option<&str>) -> Request<Body> {
    request("GET", uri, origin)
}

pub fn request(method: &str, uri: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn listing_html(files: &[&str]) -> String {
    let anchors: String = files
        .iter()
        .map(|f| format!("<li><a href=\"{f}\">{f}</a></li>\n"))
        .collect();
    format!("<html><head><title>Index</title></head><body><ul>\n{anchors}</ul></body></html>")
}
