//! Classifier abstraction.
//!
//! The model itself is an external collaborator: anything that can turn an
//! image file into per-class probabilities implements [`Classifier`]. The
//! production implementation is [`crate::YoloClassifier`].

use std::path::Path;

use crate::error::InferenceResult;

/// Raw classifier output for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassification {
    /// Index of the highest-probability class
    pub top1_index: usize,
    /// One probability per class, in class-index order
    pub probabilities: Vec<f32>,
}

impl RawClassification {
    /// Build from a probability vector, picking the top-1 index.
    ///
    /// Returns `None` for an empty vector. On exact ties the lowest index wins.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Option<Self> {
        let mut top1_index = None;
        let mut best = f32::NEG_INFINITY;
        for (index, p) in probabilities.iter().enumerate() {
            if *p > best || top1_index.is_none() {
                best = *p;
                top1_index = Some(index);
            }
        }

        top1_index.map(|top1_index| Self {
            top1_index,
            probabilities,
        })
    }

    /// Probability of the top-1 class.
    pub fn top1_confidence(&self) -> f32 {
        self.probabilities
            .get(self.top1_index)
            .copied()
            .unwrap_or(0.0)
    }
}

/// A loaded image classifier.
///
/// Implementations may block; callers run them on the blocking pool.
pub trait Classifier: Send + Sync {
    /// Class names in class-index order.
    fn class_names(&self) -> &[String];

    /// Classify the image at `image_path`.
    ///
    /// `Ok(None)` means the model ran but produced no classification output
    /// (for example a detection model was configured).
    fn classify(
        &self,
        image_path: &Path,
        confidence_threshold: f32,
    ) -> InferenceResult<Option<RawClassification>>;
}
