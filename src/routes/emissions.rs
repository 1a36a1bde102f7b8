//! Emissions calculation endpoint.

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::domain::{ActivityInput, EmissionsBreakdown};
use crate::error::ApiResult;
use crate::middleware::RequestIdExt;

/// Calculate the emissions breakdown for one activity submission.
///
/// POST /calculate
pub async fn calculate(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<ActivityInput>,
) -> ApiResult<Json<EmissionsBreakdown>> {
    let breakdown = state.calculator.calculate(&input)?;

    tracing::info!(
        request_id = headers.request_id(),
        travel_type = %input.travel_type,
        total_emission = breakdown.total_emission,
        "Calculated emissions"
    );

    Ok(Json(breakdown))
}
