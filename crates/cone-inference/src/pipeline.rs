//! Inference pipeline.
//!
//! Orchestrates path resolution, lazy model loading, the timed classify call
//! and response shaping. Reference matching and base64 ingestion are built on
//! top of [`InferencePipeline::classify_image`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use cone_models::{
    ClassProbabilities, ClassificationResult, ClassifyResponse, MatchResponse, ModelInfo,
    ReferenceCatalog, ReferenceMatch, UnclassifiedResult,
};

use crate::catalog;
use crate::classifier::RawClassification;
use crate::config::InferenceConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::handle::ModelHandle;
use crate::ingest;
use crate::metrics;
use crate::resolver;

/// Confidence threshold used when classifying for reference matching.
pub const MATCH_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// The classification pipeline shared by the HTTP and MCP services.
pub struct InferencePipeline {
    config: InferenceConfig,
    model: Arc<ModelHandle>,
}

impl InferencePipeline {
    /// Create a pipeline that lazily loads the model at `config.model_path`.
    pub fn new(config: InferenceConfig) -> Self {
        let model = Arc::new(ModelHandle::new(config.model_path.clone()));
        Self { config, model }
    }

    /// Create a pipeline around an existing model handle.
    pub fn with_model(config: InferenceConfig, model: Arc<ModelHandle>) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    /// Metadata of the loaded model, loading it if needed.
    pub async fn model_info(&self) -> InferenceResult<ModelInfo> {
        Ok(self.model.get().await?.info().clone())
    }

    /// Classify the image at `image_path`.
    ///
    /// Relative paths are resolved against the configured project root. A
    /// model run that yields no classification output is reported as
    /// [`ClassifyResponse::Unclassified`], not as an error.
    pub async fn classify_image(
        &self,
        image_path: &str,
        confidence_threshold: f32,
    ) -> InferenceResult<ClassifyResponse> {
        let result = match resolver::resolve_existing_image(image_path, &self.config.project_root) {
            Ok(path) => self.classify_path(path, confidence_threshold).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            metrics::record_failure(e.kind());
            warn!(image_path, error = %e, "Classification failed");
        }
        result
    }

    /// Decode a base64 image into a temporary file and classify it.
    ///
    /// The temporary file is removed whether classification succeeds or not.
    pub async fn classify_from_base64(
        &self,
        image_base64: &str,
        confidence_threshold: f32,
    ) -> InferenceResult<ClassifyResponse> {
        metrics::record_base64_upload();

        let image = match ingest::write_temp_image(image_base64, self.config.temp_dir.as_deref()).await {
            Ok(image) => image,
            Err(e) => {
                metrics::record_failure(e.kind());
                warn!(error = %e, "Rejected base64 image");
                return Err(e);
            }
        };

        let result = self
            .classify_path(image.path().to_path_buf(), confidence_threshold)
            .await;
        if let Err(e) = &result {
            metrics::record_failure(e.kind());
            warn!(error = %e, "Classification of uploaded image failed");
        }

        drop(image);
        result
    }

    /// List the reference catalog under the configured directory.
    pub async fn list_reference_images(&self) -> InferenceResult<ReferenceCatalog> {
        catalog::list_reference_images(&self.config.reference_images_dir).await
    }

    /// Classify `image_path` and attach the reference images of the
    /// predicted class plus the `top_k` most likely classes.
    ///
    /// An unclassified image is returned unchanged without touching the
    /// catalog.
    pub async fn match_against_references(
        &self,
        image_path: &str,
        top_k: usize,
    ) -> InferenceResult<MatchResponse> {
        let result = match self
            .classify_image(image_path, MATCH_CONFIDENCE_THRESHOLD)
            .await?
        {
            ClassifyResponse::Classified(result) => result,
            ClassifyResponse::Unclassified(unclassified) => {
                return Ok(MatchResponse::Unclassified(unclassified))
            }
        };

        let catalog = self.list_reference_images().await?;
        let matching_references = catalog.for_class(&result.predicted_class);
        debug!(
            predicted_class = %result.predicted_class,
            matches = matching_references.len(),
            "Matched against reference catalog"
        );

        Ok(MatchResponse::Matched(ReferenceMatch {
            classification: result.summary(),
            top_k_classes: result.all_classes.ranked(top_k),
            match_count: matching_references.len(),
            matching_references,
        }))
    }

    async fn classify_path(
        &self,
        path: PathBuf,
        confidence_threshold: f32,
    ) -> InferenceResult<ClassifyResponse> {
        let model = self.model.get().await?;
        let classifier = model.classifier();
        let timeout = self.config.inference_timeout;

        let start = Instant::now();
        let task = tokio::task::spawn_blocking(move || classifier.classify(&path, confidence_threshold));
        let raw = match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| InferenceError::inference(format!("classify task failed: {}", e)))??,
            Err(_) => return Err(InferenceError::Timeout(timeout.as_millis() as u64)),
        };
        let elapsed = start.elapsed();
        let inference_time_ms = elapsed.as_millis() as u64;
        metrics::record_inference_duration(elapsed.as_secs_f64());

        let Some(raw) = raw else {
            metrics::record_unclassified();
            info!(inference_time_ms, "Model returned no classification output");
            return Ok(UnclassifiedResult::no_result(inference_time_ms).into());
        };

        let result = shape_result(raw, model.info(), inference_time_ms)?;
        metrics::record_classification(&result.predicted_class);
        info!(
            predicted_class = %result.predicted_class,
            confidence = result.confidence,
            inference_time_ms,
            "Image classified"
        );
        Ok(result.into())
    }
}

/// Build the response from raw classifier output.
///
/// `confidence` is read back from the probability table so that it always
/// equals `all_classes[predicted_class]`.
fn shape_result(
    raw: RawClassification,
    info: &ModelInfo,
    inference_time_ms: u64,
) -> InferenceResult<ClassificationResult> {
    let predicted_class = info.classes.get(raw.top1_index).cloned().ok_or_else(|| {
        InferenceError::inference(format!(
            "top-1 index {} outside class table of {} classes",
            raw.top1_index,
            info.num_classes()
        ))
    })?;

    let mut all_classes = ClassProbabilities::new();
    for (index, class_name) in info.classes.iter().enumerate() {
        let probability = raw.probabilities.get(index).copied().unwrap_or(0.0);
        all_classes.insert(class_name.clone(), probability);
    }
    let confidence = all_classes.get(&predicted_class).unwrap_or(0.0);

    Ok(ClassificationResult {
        predicted_class,
        confidence,
        inference_time_ms,
        model_version: info.version(),
        all_classes,
    })
}
