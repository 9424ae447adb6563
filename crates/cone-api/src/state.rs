//! Application state.

use std::sync::Arc;

use cone_inference::{InferenceConfig, InferencePipeline};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<InferencePipeline>,
}

impl AppState {
    /// Create state with a pipeline that loads the configured model lazily.
    pub fn new(config: ApiConfig, inference: InferenceConfig) -> Self {
        Self::with_pipeline(config, Arc::new(InferencePipeline::new(inference)))
    }

    pub fn with_pipeline(config: ApiConfig, pipeline: Arc<InferencePipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Threshold applied when a request does not carry one.
    pub fn default_confidence_threshold(&self) -> f32 {
        self.pipeline.config().default_confidence_threshold
    }
}
