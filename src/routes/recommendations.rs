//! Recommendation endpoint that proxies to the Gemini-backed recommender.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::domain::{validate_breakdown, RecommendResponse};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestIdExt;

/// Generate recommendations for an emissions breakdown.
///
/// The body is shape-checked before anything leaves the process, so a bad
/// request never costs an upstream call.
///
/// POST /recommend
pub async fn recommend(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<RecommendResponse>> {
    let Value::Object(data) = body else {
        return Err(ApiError::BadRequest("Missing request data".to_string()));
    };

    let breakdown = validate_breakdown(&data)?;

    tracing::debug!(
        request_id = headers.request_id(),
        total_emission = breakdown.total_emission,
        "Requesting recommendations"
    );

    let recommendations = state.recommender.synthesize(&breakdown).await?;

    Ok(Json(RecommendResponse { recommendations }))
}
