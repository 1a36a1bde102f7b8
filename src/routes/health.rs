use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to the Carbon Emissions API!";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ai_service: String,
}

/// GET /
pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

/// Readiness summary. Does not call the AI service; it only reports whether
/// a key is configured.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai_service = if state.recommender.is_configured() {
        "configured"
    } else {
        "missing_api_key"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_service: ai_service.to_string(),
    })
}
