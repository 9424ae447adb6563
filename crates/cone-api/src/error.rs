//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use cone_inference::InferenceError;

use crate::config::is_production_environment;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Inference(InferenceError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Inference(e) => match e {
                InferenceError::ImageNotFound(_) => StatusCode::NOT_FOUND,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(e: InferenceError) -> Self {
        ApiError::Inference(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let production =
            is_production_environment(&std::env::var("ENVIRONMENT").unwrap_or_default());
        let error = self.public_message(production);

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl ApiError {
    /// Message sent to clients. Server errors are masked in production.
    fn public_message(&self, production: bool) -> String {
        if production && self.status_code().is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_inference_error_status() {
        let not_found: ApiError = InferenceError::ImageNotFound(PathBuf::from("/x.jpg")).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Image not found: /x.jpg");

        let bad: ApiError = InferenceError::invalid_request("nope").into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let load: ApiError = InferenceError::ModelNotFound(PathBuf::from("best.onnx")).into();
        assert_eq!(load.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout: ApiError = InferenceError::Timeout(30_000).into();
        assert_eq!(timeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_production_masks_server_errors_only() {
        let internal: ApiError = InferenceError::model_load("bad graph").into();
        assert_eq!(internal.public_message(true), "An internal error occurred");
        assert_eq!(internal.public_message(false), "Failed to load model: bad graph");

        let missing: ApiError = InferenceError::ImageNotFound(PathBuf::from("/x.jpg")).into();
        assert_eq!(missing.public_message(true), "Image not found: /x.jpg");
    }

    #[test]
    fn test_missing_field_message() {
        let err = ApiError::bad_request("Missing image_path");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing image_path");
    }
}
