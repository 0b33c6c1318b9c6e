// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! REST surface tests, driven through the router without a socket.

use assert_json_diff::assert_json_include;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trawl_runtime::config::EngineConfig;
use trawl_runtime::engine::Engine;
use trawl_runtime::renderer::fixture::{FixtureRenderer, FixtureSite};
use trawl_runtime::renderer::{NoopRenderer, Renderer};
use trawl_runtime::rest::router;

fn site() -> FixtureSite {
    let rows: String = (0..3)
        .map(|i| format!(r#"<li class="row"><b>Row {i}</b></li>"#))
        .collect();
    FixtureSite::new()
        .page("https://data.example/table", &format!("<ul>{rows}</ul>"))
        .page("https://data.example/about", "<h1>About us</h1>")
}

fn app_with(renderer: Arc<dyn Renderer>) -> axum::Router {
    router(Arc::new(Engine::new(renderer, EngineConfig::instant())))
}

fn app() -> axum::Router {
    app_with(Arc::new(FixtureRenderer::new(site())))
}

async fn call(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call(app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_json_include!(actual: body, expected: json!({"status": "ok", "active_contexts": 0}));
}

#[tokio::test]
async fn test_scrape_list() {
    let (status, body) = call(
        app(),
        "POST",
        "/api/scrape",
        Some(json!({
            "url": "https://data.example/table",
            "mode": "list",
            "listItemSelector": "li.row",
            "fields": [{"name": "label", "selector": "b", "type": "text"}],
            "limit": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_json_include!(
        actual: body,
        expected: json!({
            "ok": true,
            "mode": "list",
            "count": 2,
            "data": [{"_index": 0, "label": "Row 0"}, {"_index": 1, "label": "Row 1"}]
        })
    );
}

#[tokio::test]
async fn test_scrape_single() {
    let (status, body) = call(
        app(),
        "POST",
        "/api/scrape",
        Some(json!({
            "url": "https://data.example/about",
            "mode": "single",
            "fields": [{"name": "heading", "selector": "h1", "type": "text"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "mode": "single", "data": {"heading": "About us"}}));
}

#[tokio::test]
async fn test_discover() {
    let (status, body) = call(
        app(),
        "POST",
        "/api/discover",
        Some(json!({"url": "https://data.example/about"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_json_include!(
        actual: body,
        expected: json!({"ok": true, "mode": "single", "pagination": {"type": "none"}})
    );
}

#[tokio::test]
async fn test_validation_failures_are_400() {
    let (status, body) = call(
        app(),
        "POST",
        "/api/scrape",
        Some(json!({
            "url": "https://data.example/table",
            "mode": "list",
            "listItemSelector": "li.row",
            "fields": [{"name": "label", "selector": "b", "type": "text"}],
            "limit": 2,
            "min": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("min cannot be greater"));

    let (status, body) = call(
        app(),
        "POST",
        "/api/scrape",
        Some(json!({"url": "https://data.example/table", "mode": "list", "fields": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one field is required");

    let (status, body) = call(app(), "POST", "/api/scrape", Some(json!({"url": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_non_json_body_answers_in_envelope() {
    for uri in ["/api/scrape", "/api/discover"] {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "text/plain")
            .body(Body::from("url=https://data.example/table"))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_json_include!(actual: body.clone(), expected: json!({"ok": false}));
        assert!(body["error"].as_str().unwrap().starts_with("invalid request:"));
    }
}

#[tokio::test]
async fn test_navigation_and_browser_failures_are_500() {
    let request = json!({
        "url": "https://missing.example/",
        "mode": "single",
        "fields": [{"name": "heading", "selector": "h1", "type": "text"}]
    });

    let (status, body) = call(app(), "POST", "/api/scrape", Some(request.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("navigation to https://missing.example/"));

    let (status, body) = call(app_with(Arc::new(NoopRenderer)), "POST", "/api/scrape", Some(request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "browser error: Browser not available");
}
