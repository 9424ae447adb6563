//! Cone inspection tool arguments and results.
//!
//! Every tool answers with a JSON object. Pipeline failures are returned as
//! an `error` field in that object, never as a JSON-RPC error.

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use cone_inference::{InferenceError, InferenceResult};
use cone_models::{ReferenceCatalog, UnclassifiedResult};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_TOP_K: usize = 3;

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassifyArgs {
    /// Path to the image file to classify
    pub image_path: String,
    /// Minimum confidence threshold
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassifyBase64Args {
    /// Base64 encoded image data
    pub image_base64: String,
    /// Minimum confidence threshold
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MatchArgs {
    /// Path to the image to classify
    pub image_path: String,
    /// Number of top matching classes to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoReport {
    pub model_path: String,
    pub model_type: &'static str,
    pub classes: Vec<String>,
    pub num_classes: usize,
    pub reference_images_dir: String,
}

/// Result of a classify-shaped tool; failures become an unclassified report.
pub fn classify_result<T: Serialize>(response: InferenceResult<T>) -> CallToolResult {
    match response {
        Ok(response) => tool_result(&response),
        Err(e) => tool_result(&UnclassifiedResult::failed(e.to_string())),
    }
}

/// Result of `list_reference_images`.
pub fn catalog_result(catalog: InferenceResult<ReferenceCatalog>) -> CallToolResult {
    match catalog {
        Ok(catalog) => tool_result(&catalog),
        Err(e) => tool_result(&json!({"error": e.to_string(), "reference_images": [], "count": 0})),
    }
}

/// Result of `get_model_info`.
pub fn model_info_result(report: Result<ModelInfoReport, InferenceError>) -> CallToolResult {
    match report {
        Ok(report) => tool_result(&report),
        Err(e) => tool_result(&json!({"error": e.to_string()})),
    }
}

/// Wrap a response as text and structured content.
///
/// The text is serialized from the typed value so map keys keep their
/// declared order. A result whose object carries `error` is flagged
/// `isError`.
pub fn tool_result<T: Serialize>(value: &T) -> CallToolResult {
    let (text, structured) = match serde_json::to_string(value)
        .and_then(|text| serde_json::from_str::<Value>(&text).map(|v| (text, v)))
    {
        Ok(pair) => pair,
        Err(e) => {
            let fallback = json!({"error": e.to_string()});
            (fallback.to_string(), fallback)
        }
    };

    let is_error = structured.get("error").is_some();
    let content = vec![Content::text(text)];
    let mut result = if is_error {
        warn!("Tool returned an error result");
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    };
    result.structured_content = Some(structured);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cone_models::{ClassProbabilities, ClassificationResult, ClassifyResponse};

    fn wire(result: &CallToolResult) -> Value {
        serde_json::to_value(result).unwrap()
    }

    #[test]
    fn test_arguments_default() {
        let args: ClassifyArgs = serde_json::from_value(json!({"image_path": "a.jpg"})).unwrap();
        assert_eq!(args.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);

        let args: MatchArgs = serde_json::from_value(json!({"image_path": "a.jpg"})).unwrap();
        assert_eq!(args.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_text_keeps_class_order() {
        let response = ClassifyResponse::Classified(ClassificationResult {
            predicted_class: "bad_tip".into(),
            confidence: 0.85,
            inference_time_ms: 4,
            model_version: "best.onnx".into(),
            all_classes: ClassProbabilities::from_pairs([
                ("good", 0.1),
                ("bad_tip", 0.85),
                ("no_tip", 0.05),
            ]),
        });

        let result = wire(&tool_result(&response));
        assert_ne!(result["isError"], true);

        let text = result["content"][0]["text"].as_str().unwrap();
        let classes = &text[text.find("\"all_classes\"").unwrap()..];
        let good = classes.find("\"good\"").unwrap();
        let bad = classes.find("\"bad_tip\"").unwrap();
        let none = classes.find("\"no_tip\"").unwrap();
        assert!(good < bad && bad < none, "{}", classes);

        let keys: Vec<_> = result["structuredContent"]["all_classes"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["good", "bad_tip", "no_tip"]);
    }

    #[test]
    fn test_failure_is_error_data() {
        let result = wire(&classify_result::<ClassifyResponse>(Err(
            InferenceError::ImageNotFound("/x/missing.jpg".into()),
        )));

        assert_eq!(result["isError"], true);
        let content = &result["structuredContent"];
        assert!(content["error"].as_str().unwrap().starts_with("Image not found: "));
        assert!(content["predicted_class"].is_null());
        assert_eq!(content["confidence"], 0.0);
        assert_eq!(content["inference_time_ms"], 0);
    }

    #[test]
    fn test_catalog_failure_shape() {
        let result = wire(&catalog_result(Err(InferenceError::Io(std::io::Error::other(
            "denied",
        )))));
        let content = &result["structuredContent"];
        assert_eq!(content["count"], 0);
        assert_eq!(content["reference_images"], json!([]));
        assert!(content["error"].is_string());
    }
}
