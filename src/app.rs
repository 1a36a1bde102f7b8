use anyhow::Result;
use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::middleware::{request_id::X_REQUEST_ID, request_id_layer};
use crate::routes;
use crate::services::{Calculator, GeminiClient, Recommender};

/// Request bodies are a handful of numbers; anything larger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// Immutable after startup, so handlers share it without locking.
pub struct AppState {
    pub settings: Settings,
    pub calculator: Calculator,
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(settings: Settings, calculator: Calculator, recommender: Recommender) -> Arc<Self> {
        Arc::new(Self {
            settings,
            calculator,
            recommender,
        })
    }

    /// Wire the calculator and recommender from loaded settings.
    pub fn from_settings(settings: Settings) -> Result<Arc<Self>> {
        let calculator = Calculator::new(settings.coefficients.clone());
        let recommender = Recommender::new(GeminiClient::new(&settings.gemini)?);
        Ok(Self::new(settings, calculator, recommender))
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Build trace layer (use DEBUG for spans to reduce overhead at INFO level)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let allow_origin = if settings.cors_allow_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = settings
            .cors_allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static(X_REQUEST_ID),
        ]))
        .max_age(std::time::Duration::from_secs(3600))
}
