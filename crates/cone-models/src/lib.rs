//! Shared data models for the cone-tip inspection services.
//!
//! This crate provides Serde-serializable types for:
//! - Classification results and per-class probabilities
//! - Reference image catalogs and match reports
//! - Model metadata and the exported class table

pub mod classification;
pub mod model;
pub mod reference;

// Re-export common types
pub use classification::{
    ClassProbabilities, ClassificationResult, ClassificationSummary, ClassifyResponse,
    RankedClass, UnclassifiedResult,
};
pub use model::{ClassMapping, ModelClasses, ModelInfo, MODEL_TYPE};
pub use reference::{MatchResponse, ReferenceCatalog, ReferenceImage, ReferenceMatch};
