//! Client for the Gemini `generateContent` API.
//!
//! One request per call: no streaming, no retries. Failures are mapped onto
//! [`RecommendationError`] so the caller can tell credential problems from
//! upstream outages.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::domain::RecommendationError;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Client-side timeout; `None` leaves the transport default in place.
    pub timeout_seconds: Option<u64>,
}

/// Client for the Gemini text generation endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// A missing API key is not an error here; it is reported on each call
    /// before any network I/O happens.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        tracing::info!(
            base_url = %config.base_url,
            model = %config.model,
            api_key_configured = api_key.is_some(),
            "Gemini client initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a prompt and return the concatenated text of the first candidate.
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate_text(&self, prompt: &str) -> Result<String, RecommendationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RecommendationError::AuthConfig("GEMINI_API_KEY is not configured".to_string())
        })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                response_mime_type: "application/json",
            },
        };

        debug!(url = %url, "Gemini request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, timeout = e.is_timeout(), "Gemini request failed");
                if e.is_timeout() {
                    RecommendationError::Upstream("request to Gemini timed out".to_string())
                } else {
                    RecommendationError::Upstream(format!("Gemini unavailable: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<GeminiErrorResponse>()
                .await
                .ok()
                .map(|body| body.error.message)
                .unwrap_or_else(|| format!("Gemini error: {}", status));

            return Err(map_error_status(status, message));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                RecommendationError::ResponseShape(format!("invalid Gemini response body: {}", e))
            })?;

        extract_text(parsed)
    }
}

fn map_error_status(status: StatusCode, message: String) -> RecommendationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            error!(status = %status, "Gemini rejected the API key");
            RecommendationError::AuthConfig(message)
        }
        // Gemini reports a malformed key as 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if message.contains("API key") => {
            error!(status = %status, "Gemini rejected the API key");
            RecommendationError::AuthConfig(message)
        }
        _ => {
            error!(status = %status, message = %message, "Gemini error");
            RecommendationError::Upstream(message)
        }
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, RecommendationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt blocked ({})", reason))
            .unwrap_or_else(|| "no candidates returned".to_string());
        warn!(reason = %reason, "Gemini returned no candidates");
        return Err(RecommendationError::ResponseShape(reason));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .map(|reason| format!("empty candidate (finish reason {})", reason))
            .unwrap_or_else(|| "empty candidate".to_string());
        return Err(RecommendationError::ResponseShape(reason));
    }

    Ok(text)
}
