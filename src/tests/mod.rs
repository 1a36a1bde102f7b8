//! Router-level tests.
//!
//! These drive the full axum app (middleware included) with
//! `tower::ServiceExt::oneshot` and use WireMock in place of the Gemini API.


use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::app::{create_app, AppState};
use crate::config::Settings;
use crate::error::ErrorResponse;

pub(crate) const TEST_MODEL: &str = "gemini-test";
pub(crate) const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

/// Build the app against a Gemini base URL, optionally with an API key.
pub(crate) fn test_app(gemini_base_url: &str, api_key: Option<&str>) -> Router {
    let settings = Settings::from_vars(|key| match key {
        "GEMINI_BASE_URL" => Some(gemini_base_url.to_string()),
        "GEMINI_MODEL" => Some(TEST_MODEL.to_string()),
        "GEMINI_API_KEY" => api_key.map(str::to_string),
        "GEMINI_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    })
    .expect("test settings load");

    create_app(AppState::from_settings(settings).expect("app state builds"))
}

pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub(crate) async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    send(app, request).await
}

/// Assert the body is exactly `{"error": "<non-empty>"}`.
pub(crate) fn assert_error_envelope(body: &Value) {
    let object = body.as_object().expect("error body is a JSON object");
    assert_eq!(object.len(), 1, "unexpected keys in error body: {body}");
    let envelope: ErrorResponse =
        serde_json::from_value(body.clone()).expect("error field is a string");
    assert!(!envelope.error.is_empty());
}

#[tokio::test]
async fn root_returns_welcome_text() {
    let app = test_app("http://127.0.0.1:9", None);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], crate::routes::health::WELCOME_MESSAGE.as_bytes());
}

#[tokio::test]
async fn health_reports_missing_api_key() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(test_app("http://127.0.0.1:9", None), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ai_service"], "missing_api_key");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, body) = send(test_app("http://127.0.0.1:9", Some("key")), request).await;
    assert_eq!(body["ai_service"], "configured");
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let app = test_app("http://127.0.0.1:9", None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
