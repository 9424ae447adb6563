//! Model metadata handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use cone_models::{ClassMapping, MODEL_TYPE};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModelInfoResponse {
    pub model_path: String,
    pub model_type: &'static str,
    pub classes: Vec<String>,
    pub num_classes: usize,
    pub class_mapping: ClassMapping,
}

/// Describe the loaded model, loading it on first use.
pub async fn model_info(State(state): State<AppState>) -> ApiResult<Json<ModelInfoResponse>> {
    let info = state.pipeline.model_info().await?;

    Ok(Json(ModelInfoResponse {
        model_path: info.path.clone(),
        model_type: MODEL_TYPE,
        num_classes: info.num_classes(),
        class_mapping: info.class_mapping(),
        classes: info.classes,
    }))
}
