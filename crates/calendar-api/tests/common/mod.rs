//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use calendar_api::build_router;
use calendar_api::config::StorageKind;
use calendar_api::state::AppState;
use calendar_store::MemoryEventStore;
use calendar_test_support::SequenceIdGenerator;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Build the full app router over a fresh `MemoryEventStore` and a
/// deterministic id sequence (`evt-0001`, `evt-0002`, ...).
pub fn build_test_app() -> Router {
    let app_state = AppState::new(
        Arc::new(MemoryEventStore::new()),
        Arc::new(SequenceIdGenerator::new()),
        StorageKind::Memory,
        CancellationToken::new(),
    );
    build_router(app_state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Empty bodies and axum's plain-text rejections read as null.
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

fn with_json(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, with_json("POST", uri, body)).await
}

/// Send a PATCH request with a JSON body and return the response.
pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, with_json("PATCH", uri, body)).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// JSON body for a create request owned by `user_id`.
pub fn new_event(user_id: i64, title: &str, start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "title": title,
        "start": start,
        "end": end,
    })
}

/// Titles of a listing response, in order.
pub fn titles(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_owned())
        .collect()
}
