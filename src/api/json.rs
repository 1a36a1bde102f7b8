//! JSON body extractor whose rejections use the service error envelope.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// Drop-in for [`axum::Json`] that turns malformed or missing bodies into a
/// 400 `{"error": ...}` response instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
