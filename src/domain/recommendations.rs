//! Recommendation domain types returned by `/recommend`.

use serde::{Deserialize, Serialize};

/// Category-keyed improvement suggestions.
///
/// Every required category holds at least one suggestion; the recommender
/// refuses to build a value otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub travel: Vec<String>,
    pub energy: Vec<String>,
    pub food: Vec<String>,
    pub shopping: Vec<String>,
    /// Overall advice that doesn't belong to a single category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general: Vec<String>,
}

/// Categories a recommendation set must cover.
pub const REQUIRED_CATEGORIES: [&str; 4] = ["travel", "energy", "food", "shopping"];

/// Response body for a successful `/recommend` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Recommendations,
}

/// Failure while producing recommendations.
///
/// Each variant is reported separately; none of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationError {
    /// API key missing, or rejected by the upstream service.
    #[error("AI service credentials error: {0}")]
    AuthConfig(String),

    /// Transport failure, timeout or non-success status from upstream.
    #[error("AI service request failed: {0}")]
    Upstream(String),

    /// Upstream answered, but not with something we can map to recommendations.
    #[error("AI service returned an unusable response: {0}")]
    ResponseShape(String),
}
