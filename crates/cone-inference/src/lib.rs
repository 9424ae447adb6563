//! Cone-tip classification pipeline.
//!
//! This crate provides:
//! - A [`Classifier`] abstraction and its YOLOv8 ONNX implementation
//! - A lazily loaded, process-wide [`ModelHandle`]
//! - Image path resolution against a project root
//! - The [`InferencePipeline`] shared by the HTTP and MCP services
//! - Reference catalog listing and base64 image ingestion

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handle;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod resolver;
pub mod yolo;

pub use catalog::list_reference_images;
pub use classifier::{Classifier, RawClassification};
pub use config::InferenceConfig;
pub use error::{InferenceError, InferenceResult};
pub use handle::{LoadedModel, ModelHandle};
pub use ingest::{decode_image_base64, write_temp_image, TempImage};
pub use pipeline::{InferencePipeline, MATCH_CONFIDENCE_THRESHOLD};
pub use resolver::{resolve_existing_image, resolve_image_path};
pub use yolo::YoloClassifier;
