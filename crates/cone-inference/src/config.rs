//! Inference configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default model location, relative to the service directory.
pub const DEFAULT_MODEL_PATH: &str = "./models/best.onnx";

/// Default reference image root.
pub const DEFAULT_REFERENCE_IMAGES_DIR: &str = "./reference_images";

/// Configuration shared by the HTTP and MCP services.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Path to the ONNX classification model
    pub model_path: PathBuf,
    /// Root of the reference image tree (one subdirectory per class)
    pub reference_images_dir: PathBuf,
    /// Directory relative image paths are resolved against
    pub project_root: PathBuf,
    /// Threshold used when a caller does not pass one
    pub default_confidence_threshold: f32,
    /// Upper bound on a single classify call
    pub inference_timeout: Duration,
    /// Directory for decoded base64 images (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            reference_images_dir: PathBuf::from(DEFAULT_REFERENCE_IMAGES_DIR),
            project_root: default_project_root(),
            default_confidence_threshold: 0.3,
            inference_timeout: Duration::from_secs(30),
            temp_dir: None,
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            reference_images_dir: std::env::var("REFERENCE_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_REFERENCE_IMAGES_DIR)),
            project_root: std::env::var("PROJECT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_project_root()),
            default_confidence_threshold: std::env::var("DEFAULT_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.3),
            inference_timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            temp_dir: std::env::var("TEMP_IMAGE_DIR").ok().map(PathBuf::from),
        }
    }

    /// Set the model path.
    pub fn with_model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the project root used for relative image paths.
    pub fn with_project_root(mut self, root: impl AsRef<Path>) -> Self {
        self.project_root = root.as_ref().to_path_buf();
        self
    }

    /// Set the reference image root.
    pub fn with_reference_images_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.reference_images_dir = dir.as_ref().to_path_buf();
        self
    }
}

/// The service runs from its own directory, one level below the project root.
fn default_project_root() -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => cwd.parent().map(Path::to_path_buf).unwrap_or(cwd),
        Err(_) => PathBuf::from(".."),
    }
}
