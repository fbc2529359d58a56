// Drives the full Axum router (middleware included) against an in-memory upstream.
mod common;

use std::sync::Arc;

use axum::http::{StatusCode, header};
use chrono::{DateTime, SecondsFormat, Utc};
use common::*;
use taproom::{
    adapters::X_REQUEST_ID, core::registry::EMBEDDED_REGISTRY,
    ports::http_client::HttpClientError,
};
use tower::ServiceExt; // for oneshot

#[tokio::test]
async fn test_festival_registry_both_paths_identical() {
    let upstream = Arc::new(MockUpstream::new());

    let with_ext = app(upstream.clone())
        .oneshot(get("/festivals.json", Some(APP_ORIGIN)))
        .await
        .unwrap();
    let without_ext = app(upstream.clone())
        .oneshot(get("/festivals", Some(APP_ORIGIN)))
        .await
        .unwrap();

    assert_eq!(with_ext.status(), StatusCode::OK);
    assert_eq!(without_ext.status(), StatusCode::OK);
    assert_eq!(
        with_ext.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, must-revalidate"
    );

    let a = body_bytes(with_ext).await;
    let b = body_bytes(without_ext).await;
    assert_eq!(a, b);
    assert_eq!(a, EMBEDDED_REGISTRY.as_bytes());

    let doc: serde_json::Value = serde_json::from_slice(&a).unwrap();
    let default_id = doc["default_festival_id"].as_str().unwrap();
    assert!(
        doc["festivals"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f["id"] == default_id)
    );
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_beverage_types_discovered_from_listing() {
    let upstream = Arc::new(MockUpstream::new().page(
        "/cbf2025/",
        200,
        listing_html(&["beer.json", "cider.json", "available_beverage_types.json"]),
    ));

    let response = app(upstream.clone())
        .oneshot(get(
            "/cbf2025/available_beverage_types.json",
            Some(APP_ORIGIN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        APP_ORIGIN
    );

    let json = body_json(response).await;
    assert_eq!(json["festival_id"], "cbf2025");
    assert_eq!(
        json["available_beverage_types"],
        serde_json::json!(["beer", "cider"])
    );

    let requests = upstream.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0], ("GET".to_string(), format!("{UPSTREAM}/cbf2025/")));
}

#[tokio::test]
async fn test_hyphenated_types_are_sorted() {
    let upstream = Arc::new(MockUpstream::new().page(
        "/cbfw2025/",
        200,
        listing_html(&["international-beer.json", "low-no.json", "apple-juice.json"]),
    ));

    let response = app(upstream)
        .oneshot(get("/cbfw2025/available_beverage_types.json", None))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(
        json["available_beverage_types"],
        serde_json::json!(["apple-juice", "international-beer", "low-no"])
    );
}

#[tokio::test]
async fn test_empty_listing_is_success() {
    let upstream =
        Arc::new(MockUpstream::new().page("/cbf2024/", 200, listing_html(&["readme.txt"])));

    let response = app(upstream)
        .oneshot(get("/cbf2024/available_beverage_types.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["available_beverage_types"], serde_json::json!([]));
}

#[tokio::test]
async fn test_timestamp_is_round_trip_stable() {
    let upstream = Arc::new(MockUpstream::new().page("/cbf2025/", 200, listing_html(&[])));

    let response = app(upstream)
        .oneshot(get("/cbf2025/available_beverage_types.json", None))
        .await
        .unwrap();

    let json = body_json(response).await;
    let timestamp = json["timestamp"].as_str().unwrap();
    let parsed: DateTime<Utc> = timestamp.parse().unwrap();
    assert_eq!(
        parsed.to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp
    );
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_unknown_festival_is_404() {
    // No page registered: the mock answers 404 for /nonexistent/.
    let upstream = Arc::new(MockUpstream::new());

    let response = app(upstream)
        .oneshot(get("/nonexistent/available_beverage_types.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Festival not found", "festival_id": "nonexistent"})
    );
}

#[tokio::test]
async fn test_listing_fetch_failure_is_500() {
    let upstream = Arc::new(MockUpstream::failing(HttpClientError::ConnectionError(
        "Connection refused".to_string(),
    )));

    let response = app(upstream)
        .oneshot(get("/cbf2025/available_beverage_types.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({
            "error": "Failed to fetch beverage types",
            "message": "Connection refused"
        })
    );
}

#[tokio::test]
async fn test_passthrough_preserves_status_and_body() {
    for (status, body) in [
        (200, r#"{"producers":[]}"#),
        (404, "Not Found"),
        (503, "upstream maintenance"),
    ] {
        let upstream = Arc::new(MockUpstream::new().page("/cbf2025/beer.json?v=2", status, body));

        let response = app(upstream)
            .oneshot(get("/cbf2025/beer.json?v=2", Some(PREVIEW_ORIGIN)))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), status);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            PREVIEW_ORIGIN
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
        assert_eq!(body_bytes(response).await, body.as_bytes());
    }
}

#[tokio::test]
async fn test_passthrough_failure_is_502() {
    let upstream = Arc::new(MockUpstream::failing(HttpClientError::Timeout(30)));

    let response = app(upstream)
        .oneshot(get("/cbf2025/beer.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Proxy error");
    assert_eq!(
        json["message"],
        "Upstream request timed out after 30 seconds"
    );
}

#[tokio::test]
async fn test_cors_echoes_each_callers_origin() {
    let upstream = Arc::new(MockUpstream::new());

    for origin in [APP_ORIGIN, PREVIEW_ORIGIN, "http://localhost:8080"] {
        let response = app(upstream.clone())
            .oneshot(get("/health", Some(origin)))
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            origin
        );
    }
}

#[tokio::test]
async fn test_disallowed_origin_gets_no_grant() {
    let upstream = Arc::new(MockUpstream::new());

    for origin in [
        "https://evil.example.com",
        "https://cambeerfestival.pages.dev.evil.com",
        "null",
    ] {
        let response = app(upstream.clone())
            .oneshot(get("/festivals", Some(origin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "origin {origin} should not be granted"
        );
    }
}

#[tokio::test]
async fn test_preflight_never_reaches_upstream() {
    let upstream = Arc::new(MockUpstream::new());

    let response = app(upstream.clone())
        .oneshot(request("OPTIONS", "/anything/at/all", Some(APP_ORIGIN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, OPTIONS"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let upstream = Arc::new(MockUpstream::new().page("/cbf2025/", 200, listing_html(&[])));

    for uri in [
        "/health",
        "/festivals",
        "/cbf2025/available_beverage_types.json",
        "/cbf2025/beer.json",
    ] {
        let response = app(upstream.clone()).oneshot(get(uri, None)).await.unwrap();
        let id = response
            .headers()
            .get(X_REQUEST_ID)
            .unwrap_or_else(|| panic!("missing request id on {uri}"));
        assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }
}
