//! Lazily loaded, process-wide model handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use cone_models::ModelInfo;

use crate::classifier::Classifier;
use crate::error::{InferenceError, InferenceResult};
use crate::yolo::YoloClassifier;

/// Function that loads a classifier from a model path.
pub type ModelLoader = dyn Fn(&Path) -> InferenceResult<Arc<dyn Classifier>> + Send + Sync;

/// A classifier together with its fixed metadata snapshot.
pub struct LoadedModel {
    classifier: Arc<dyn Classifier>,
    info: ModelInfo,
}

impl LoadedModel {
    fn new(path: &Path, classifier: Arc<dyn Classifier>) -> Self {
        let info = ModelInfo::new(
            path.display().to_string(),
            classifier.class_names().to_vec(),
        );
        Self { classifier, info }
    }

    pub fn classifier(&self) -> Arc<dyn Classifier> {
        Arc::clone(&self.classifier)
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Owns the model path and loads the classifier on first use.
///
/// A failed load is not remembered: the next `get` tries again. Once a load
/// succeeds the model is never reloaded.
pub struct ModelHandle {
    path: PathBuf,
    loader: Arc<ModelLoader>,
    model: OnceCell<LoadedModel>,
}

impl ModelHandle {
    /// Handle that loads a YOLOv8 ONNX classifier from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, |p: &Path| {
            YoloClassifier::load(p).map(|c| Arc::new(c) as Arc<dyn Classifier>)
        })
    }

    /// Handle with a custom loader.
    pub fn with_loader<F>(path: impl Into<PathBuf>, loader: F) -> Self
    where
        F: Fn(&Path) -> InferenceResult<Arc<dyn Classifier>> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            loader: Arc::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Handle around an already loaded classifier.
    pub fn preloaded(path: impl Into<PathBuf>, classifier: Arc<dyn Classifier>) -> Self {
        let path = path.into();
        let model = LoadedModel::new(&path, classifier);
        Self {
            loader: Arc::new(move |p: &Path| {
                Err(InferenceError::model_load(format!(
                    "model at {} is preloaded",
                    p.display()
                )))
            }),
            model: OnceCell::new_with(Some(model)),
            path,
        }
    }

    /// Configured model path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Get the model, loading it on first use.
    pub async fn get(&self) -> InferenceResult<&LoadedModel> {
        self.model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let path = self.path.clone();

                let classifier = tokio::task::spawn_blocking(move || loader(&path))
                    .await
                    .map_err(|e| InferenceError::model_load(format!("model load task failed: {}", e)))?
                    .map_err(|e| {
                        error!("Failed to load model from {}: {}", self.path.display(), e);
                        e
                    })?;

                let model = LoadedModel::new(&self.path, classifier);
                info!(
                    "Model loaded from {} ({} classes: {:?})",
                    self.path.display(),
                    model.info.num_classes(),
                    model.info.classes
                );
                Ok::<_, InferenceError>(model)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::classifier::RawClassification;

    struct FixedClassifier(Vec<String>);

    impl Classifier for FixedClassifier {
        fn class_names(&self) -> &[String] {
            &self.0
        }

        fn classify(&self, _: &Path, _: f32) -> InferenceResult<Option<RawClassification>> {
            Ok(RawClassification::from_probabilities(vec![1.0]))
        }
    }

    #[tokio::test]
    async fn test_missing_model_file() {
        let handle = ModelHandle::new("/nonexistent/best.onnx");
        let err = handle.get().await.err().unwrap();
        assert!(err.is_model_load());
        assert!(!handle.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let handle = ModelHandle::with_loader("best.onnx", move |p: &Path| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(InferenceError::ModelNotFound(p.to_path_buf()))
            } else {
                Ok(Arc::new(FixedClassifier(vec!["good".into()])) as Arc<dyn Classifier>)
            }
        });

        assert!(handle.get().await.is_err());
        let model = handle.get().await.unwrap();
        assert_eq!(model.info().classes, vec!["good"]);

        // Loaded once, never reloaded.
        handle.get().await.unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(handle.is_loaded());
    }

    #[tokio::test]
    async fn test_preloaded() {
        let handle = ModelHandle::preloaded(
            "models/best.onnx",
            Arc::new(FixedClassifier(vec!["a".into(), "b".into()])),
        );
        assert!(handle.is_loaded());
        let model = handle.get().await.unwrap();
        assert_eq!(model.info().num_classes(), 2);
        assert_eq!(model.info().path, "models/best.onnx");
    }
}
