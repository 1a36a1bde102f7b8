pub mod emissions;
pub mod health;
pub mod recommendations;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health_check))
        .route("/calculate", post(emissions::calculate))
        .route("/recommend", post(recommendations::recommend))
}
