//! Error types for inference operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors that can occur while classifying an image.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Inference timed out after {0} ms")]
    Timeout(u64),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    /// Create a model load failure error.
    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether the configured model could not be loaded.
    pub fn is_model_load(&self) -> bool {
        matches!(self, Self::ModelNotFound(_) | Self::ModelLoad(_))
    }

    /// Whether the caller supplied bad input rather than the service failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ImageNotFound(_)
                | Self::InvalidRequest(_)
                | Self::InvalidBase64(_)
                | Self::InvalidImage(_)
        )
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelNotFound(_) | Self::ModelLoad(_) => "model_load",
            Self::ImageNotFound(_) => "image_not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidBase64(_) => "invalid_base64",
            Self::InvalidImage(_) => "invalid_image",
            Self::Timeout(_) => "timeout",
            Self::Inference(_) => "inference",
            Self::Io(_) => "io",
        }
    }
}
