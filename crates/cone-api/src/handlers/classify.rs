//! Classification handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use cone_models::ClassifyResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Classify request body.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub image_path: Option<String>,
    pub confidence_threshold: Option<f32>,
}

/// Classify the image at `image_path`.
///
/// An image the model could not classify is still a 200 with the
/// unclassified shape.
pub async fn classify(
    State(state): State<AppState>,
    body: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<Json<ClassifyResponse>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let image_path = request
        .image_path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing image_path"))?;
    let confidence_threshold = request
        .confidence_threshold
        .unwrap_or_else(|| state.default_confidence_threshold());

    info!(image_path = %image_path, confidence_threshold, "Classify request");
    let response = state
        .pipeline
        .classify_image(&image_path, confidence_threshold)
        .await?;

    Ok(Json(response))
}
