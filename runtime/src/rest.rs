// Copyright 2026 Trawl Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API.
//!
//! Every response carries `ok`. Failures answer `{ok: false, error}` with
//! 400 for malformed requests and 500 for browser or navigation failures.

use crate::engine::Engine;
use crate::errors::TrawlError;
use crate::types::{DiscoveryRequest, ExtractionRequest};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// Build the axum Router with all REST endpoints.
pub fn router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/discover", post(handle_discover))
        .route("/api/scrape", post(handle_scrape))
        .layer(cors)
        .with_state(AppState { engine })
}

/// Serve the REST API until the listener fails or ctrl-c is received.
pub async fn serve(host: &str, port: u16, engine: Arc<Engine>) -> anyhow::Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("REST API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
        })
        .await?;
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "ok": false, "error": message.into() }))).into_response()
}

fn from_error(e: &TrawlError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    failure(status, e.to_string())
}

/// Parse a body by hand so syntax and shape errors answer in the same
/// envelope.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("invalid request: {e}")))
}

/// `{ok: true}` merged with the object form of `payload`.
fn success(payload: Value) -> Response {
    let mut body = Map::new();
    body.insert("ok".into(), Value::Bool(true));
    if let Value::Object(fields) = payload {
        body.extend(fields);
    }
    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_contexts": state.engine.renderer().active_contexts(),
    }))
}

async fn handle_discover(State(state): State<AppState>, body: Bytes) -> Response {
    let req: DiscoveryRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state.engine.discover(req).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(v) => success(v),
            Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
        Err(e) => from_error(&e),
    }
}

async fn handle_scrape(State(state): State<AppState>, body: Bytes) -> Response {
    let req: ExtractionRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state.engine.extract(req).await {
        Ok(output) => success(output.to_json()),
        Err(e) => from_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_flattens_payload() {
        let resp = success(json!({"count": 2, "data": []}));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_bad_body_is_400() {
        let err = parse_body::<ExtractionRequest>(br#"{"url": "https://a.example"}"#);
        let resp = err.unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = parse_body::<ExtractionRequest>(b"url=https://a.example").unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
