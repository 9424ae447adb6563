//! Classification result models.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Message reported when the model ran but produced no class probabilities.
pub const NO_RESULT_MESSAGE: &str = "No classification results returned";

/// Per-class probabilities in the model's class-index order.
///
/// Serializes as a JSON object (`{"good": 0.91, "bad": 0.09}`) whose key
/// order follows the model's class table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassProbabilities(Vec<(String, f32)>);

impl ClassProbabilities {
    /// Create an empty probability table.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create from `(class, probability)` pairs, keeping their order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, probability) in pairs {
            table.insert(name, probability);
        }
        table
    }

    /// Set the probability for a class. A repeated class name keeps its
    /// original position and takes the latest value.
    pub fn insert(&mut self, class_name: impl Into<String>, probability: f32) {
        let class_name = class_name.into();
        match self.0.iter_mut().find(|(name, _)| *name == class_name) {
            Some(entry) => entry.1 = probability,
            None => self.0.push((class_name, probability)),
        }
    }

    /// Probability for a class, if the model knows it.
    pub fn get(&self, class_name: &str) -> Option<f32> {
        self.0
            .iter()
            .find(|(name, _)| name == class_name)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(class, probability)` in class-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(name, p)| (name.as_str(), *p))
    }

    /// Classes ranked by probability, highest first, truncated to `top_k`.
    ///
    /// The sort is stable: exact ties keep class-index order.
    pub fn ranked(&self, top_k: usize) -> Vec<RankedClass> {
        let mut ranked: Vec<&(String, f32)> = self.0.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(top_k)
            .map(|(name, p)| RankedClass {
                class_name: name.clone(),
                confidence: *p,
            })
            .collect()
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, probability) in &self.0 {
            map.serialize_entry(name, probability)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassProbabilities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProbabilitiesVisitor;

        impl<'de> Visitor<'de> for ProbabilitiesVisitor {
            type Value = ClassProbabilities;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of class name to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = ClassProbabilities::new();
                while let Some((name, probability)) = access.next_entry::<String, f32>()? {
                    table.insert(name, probability);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(ProbabilitiesVisitor)
    }
}

/// A successful top-1 classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Top-1 class name
    pub predicted_class: String,
    /// Top-1 probability, always equal to `all_classes[predicted_class]`
    pub confidence: f32,
    /// Wall-clock time of the classify call, truncated to milliseconds
    pub inference_time_ms: u64,
    /// File name of the model that produced the result
    pub model_version: String,
    /// Every class the model knows with its probability
    pub all_classes: ClassProbabilities,
}

impl ClassificationResult {
    /// Summary used in reference-match reports.
    pub fn summary(&self) -> ClassificationSummary {
        ClassificationSummary {
            predicted_class: self.predicted_class.clone(),
            confidence: self.confidence,
            inference_time_ms: self.inference_time_ms,
        }
    }
}

/// A classification that produced no top-1 class.
///
/// Used both for the soft "model ran, no output" case and for failures
/// reported as data (`inference_time_ms` is then 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnclassifiedResult {
    pub error: String,
    pub predicted_class: Option<String>,
    pub confidence: f32,
    pub inference_time_ms: u64,
}

impl UnclassifiedResult {
    /// The model ran for `inference_time_ms` but returned nothing usable.
    pub fn no_result(inference_time_ms: u64) -> Self {
        Self {
            error: NO_RESULT_MESSAGE.to_string(),
            predicted_class: None,
            confidence: 0.0,
            inference_time_ms,
        }
    }

    /// The pipeline failed before or during inference.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            predicted_class: None,
            confidence: 0.0,
            inference_time_ms: 0,
        }
    }
}

/// Wire shape of a classify call: either a result or an unclassified report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifyResponse {
    Classified(ClassificationResult),
    Unclassified(UnclassifiedResult),
}

impl ClassifyResponse {
    /// Error message, if this response carries one.
    pub fn error(&self) -> Option<&str> {
        match self {
            ClassifyResponse::Classified(_) => None,
            ClassifyResponse::Unclassified(u) => Some(&u.error),
        }
    }
}

impl From<ClassificationResult> for ClassifyResponse {
    fn from(result: ClassificationResult) -> Self {
        ClassifyResponse::Classified(result)
    }
}

impl From<UnclassifiedResult> for ClassifyResponse {
    fn from(result: UnclassifiedResult) -> Self {
        ClassifyResponse::Unclassified(result)
    }
}

/// Top-1 summary without the probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub predicted_class: String,
    pub confidence: f32,
    pub inference_time_ms: u64,
}

/// One entry of a ranked class list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedClass {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassProbabilities {
        ClassProbabilities::from_pairs([("A", 0.7), ("B", 0.2), ("C", 0.1)])
    }

    #[test]
    fn test_ranked_top_k() {
        let ranked = ClassProbabilities::from_pairs([("C", 0.1), ("A", 0.7), ("B", 0.2)]).ranked(2);
        assert_eq!(
            ranked,
            vec![
                RankedClass { class_name: "A".to_string(), confidence: 0.7 },
                RankedClass { class_name: "B".to_string(), confidence: 0.2 },
            ]
        );
    }

    #[test]
    fn test_ranked_ties_keep_index_order() {
        let table = ClassProbabilities::from_pairs([("x", 0.5), ("y", 0.5), ("z", 0.0)]);
        let names: Vec<_> = table.ranked(3).into_iter().map(|r| r.class_name).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_ranked_top_k_larger_than_table() {
        assert_eq!(sample().ranked(10).len(), 3);
        assert!(sample().ranked(0).is_empty());
    }

    #[test]
    fn test_probabilities_serialize_in_class_order() {
        let json = serde_json::to_string(&ClassProbabilities::from_pairs([("zeta", 0.5), ("alpha", 0.5)])).unwrap();
        assert_eq!(json, r#"{"zeta":0.5,"alpha":0.5}"#);

        let parsed: ClassProbabilities = serde_json::from_str(&json).unwrap();
        let order: Vec<_> = parsed.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(order, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_insert_duplicate_keeps_position() {
        let mut table = sample();
        table.insert("A", 0.6);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("A"), Some(0.6));
        assert_eq!(table.iter().next().map(|(n, _)| n), Some("A"));
    }

    #[test]
    fn test_unclassified_shape() {
        let value = serde_json::to_value(ClassifyResponse::from(UnclassifiedResult::no_result(12))).unwrap();
        assert_eq!(value["error"], NO_RESULT_MESSAGE);
        assert!(value["predicted_class"].is_null());
        assert_eq!(value["confidence"], 0.0);
        assert_eq!(value["inference_time_ms"], 12);
    }

    #[test]
    fn test_classify_response_untagged_roundtrip() {
        let result = ClassificationResult {
            predicted_class: "A".to_string(),
            confidence: 0.7,
            inference_time_ms: 5,
            model_version: "best.onnx".to_string(),
            all_classes: sample(),
        };
        let json = serde_json::to_string(&ClassifyResponse::from(result.clone())).unwrap();
        let parsed: ClassifyResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ClassifyResponse::Classified(result));
        assert!(parsed.error().is_none());
    }

    #[test]
    fn test_ranked_class_field_name() {
        let value = serde_json::to_value(RankedClass { class_name: "A".to_string(), confidence: 0.5 }).unwrap();
        assert_eq!(value["class"], "A");
    }
}
