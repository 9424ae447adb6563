//! Reference image models.

use serde::{Deserialize, Serialize};

use crate::classification::{ClassificationSummary, RankedClass, UnclassifiedResult};

/// A labeled example image, grouped by its parent directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    #[serde(rename = "class")]
    pub class_name: String,
    pub filename: String,
    pub path: String,
}

/// Result of a reference catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    pub reference_images: Vec<ReferenceImage>,
    pub count: usize,
}

impl ReferenceCatalog {
    pub fn new(reference_images: Vec<ReferenceImage>) -> Self {
        Self {
            count: reference_images.len(),
            reference_images,
        }
    }

    /// References whose class equals `class_name`.
    pub fn for_class(&self, class_name: &str) -> Vec<ReferenceImage> {
        self.reference_images
            .iter()
            .filter(|r| r.class_name == class_name)
            .cloned()
            .collect()
    }
}

/// A classification matched against the reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMatch {
    pub classification: ClassificationSummary,
    pub top_k_classes: Vec<RankedClass>,
    pub matching_references: Vec<ReferenceImage>,
    pub match_count: usize,
}

/// Wire shape of a match call. An unclassified image is reported as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchResponse {
    Matched(ReferenceMatch),
    Unclassified(UnclassifiedResult),
}

impl MatchResponse {
    pub fn error(&self) -> Option<&str> {
        match self {
            MatchResponse::Matched(_) => None,
            MatchResponse::Unclassified(u) => Some(&u.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(class_name: &str, filename: &str) -> ReferenceImage {
        ReferenceImage {
            class_name: class_name.to_string(),
            filename: filename.to_string(),
            path: format!("reference_images/{}/{}", class_name, filename),
        }
    }

    #[test]
    fn test_catalog_count_and_filter() {
        let catalog = ReferenceCatalog::new(vec![
            reference("good", "a.jpg"),
            reference("bad", "b.png"),
            reference("good", "c.png"),
        ]);
        assert_eq!(catalog.count, 3);
        assert_eq!(catalog.for_class("good").len(), 2);
        assert!(catalog.for_class("unknown").is_empty());
    }

    #[test]
    fn test_reference_image_field_names() {
        let value = serde_json::to_value(reference("good", "a.jpg")).unwrap();
        assert_eq!(value["class"], "good");
        assert_eq!(value["filename"], "a.jpg");
    }

    #[test]
    fn test_unclassified_match_keeps_error_shape() {
        let response = MatchResponse::Unclassified(UnclassifiedResult::no_result(12));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"], "No classification results returned");
        assert!(value["predicted_class"].is_null());
        assert_eq!(value["inference_time_ms"], 12);
        assert!(value.get("matching_references").is_none());
        assert_eq!(response.error(), Some("No classification results returned"));
    }
}
