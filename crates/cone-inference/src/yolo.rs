//! Cone-tip classification using a YOLOv8 classification ONNX export.
//!
//! Runs on ONNX Runtime with automatic execution provider selection:
//! - CUDA on Linux with NVIDIA GPU (when `cuda` feature enabled)
//! - CoreML on macOS
//! - CPU fallback on all platforms

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info, warn};

use cone_models::ModelClasses;

use crate::classifier::{Classifier, RawClassification};
use crate::error::{InferenceError, InferenceResult};

/// Default classification input size for YOLOv8-cls exports.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Sidecar class table written by `inspect-model`.
pub const CLASSES_SIDECAR: &str = "model_classes.json";

/// YOLOv8 classifier backed by an ONNX Runtime session.
///
/// The session is guarded by a mutex, so concurrent callers are serialized.
pub struct YoloClassifier {
    session: Mutex<Session>,
    class_names: Vec<String>,
    input_size: u32,
    model_path: PathBuf,
}

impl YoloClassifier {
    /// Load a model from disk.
    ///
    /// Returns error if the model file doesn't exist, cannot be loaded, or
    /// carries no class names.
    pub fn load(model_path: impl AsRef<Path>) -> InferenceResult<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = create_session(model_path)?;

        let (names_meta, imgsz_meta) = match session.metadata() {
            Ok(meta) => (
                meta.custom("names").ok().flatten(),
                meta.custom("imgsz").ok().flatten(),
            ),
            Err(e) => {
                warn!("Could not read model metadata: {}", e);
                (None, None)
            }
        };

        let class_names = match names_meta.as_deref().map(parse_names_metadata) {
            Some(names) if !names.is_empty() => names,
            _ => read_classes_sidecar(model_path)?,
        };
        let class_names = validate_class_names(class_names)?;

        let input_size = imgsz_meta
            .as_deref()
            .and_then(parse_imgsz_metadata)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        info!(
            model_path = %model_path.display(),
            num_classes = class_names.len(),
            input_size,
            "Classifier initialized"
        );
        debug!("Classes: {:?}", class_names);

        Ok(Self {
            session: Mutex::new(session),
            class_names,
            input_size,
            model_path: model_path.to_path_buf(),
        })
    }

    /// Model input edge length in pixels.
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Preprocess image for YOLOv8-cls inference.
    ///
    /// - Resize the shortest side to the input size and center crop
    /// - Normalize pixel values to [0, 1]
    /// - Convert to NCHW format (batch, channels, height, width)
    fn preprocess(&self, img: &DynamicImage) -> InferenceResult<Value> {
        let size = self.input_size;
        let rgb = img.resize_to_fill(size, size, FilterType::Triangle).to_rgb8();
        let (w, h) = (size as usize, size as usize);

        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = rgb.get_pixel(x as u32, y as u32);
                    chw_data.push(pixel[c] as f32 / 255.0);
                }
            }
        }

        let shape = vec![1usize, 3, h, w];
        Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| InferenceError::inference(format!("Failed to create tensor: {}", e)))
    }

    /// Run ONNX inference, returning the output shape and values.
    fn run_inference(&self, input: Value) -> InferenceResult<(Vec<i64>, Vec<f32>)> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::inference("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError::inference(format!("ONNX inference failed: {}", e)))?;

        // YOLOv8-cls output is [1, num_classes]
        let output = outputs
            .get("output0")
            .ok_or_else(|| InferenceError::inference("Missing output0 tensor"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::inference(format!("Failed to extract tensor: {}", e)))?;

        Ok((shape.iter().copied().collect(), data.to_vec()))
    }
}

impl Classifier for YoloClassifier {
    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn classify(
        &self,
        image_path: &Path,
        confidence_threshold: f32,
    ) -> InferenceResult<Option<RawClassification>> {
        // Classification heads report every class; the threshold is only recorded.
        debug!(image = %image_path.display(), confidence_threshold, "Classifying image");

        let img = image::open(image_path).map_err(|e| {
            InferenceError::InvalidImage(format!("{}: {}", image_path.display(), e))
        })?;

        let input = self.preprocess(&img)?;
        let (shape, values) = self.run_inference(input)?;

        Ok(postprocess(&shape, values, self.class_names.len()))
    }
}

/// Interpret raw model output as class probabilities.
///
/// Anything other than a single per-class vector (for example a detection
/// head shaped `[1, 84, 8400]`) yields `None`.
fn postprocess(shape: &[i64], values: Vec<f32>, num_classes: usize) -> Option<RawClassification> {
    let is_vector = match shape {
        [n] => *n as usize == num_classes,
        [1, n] => *n as usize == num_classes,
        _ => false,
    };

    if !is_vector || values.len() != num_classes {
        warn!(
            ?shape,
            num_classes,
            "Model output is not a classification vector"
        );
        return None;
    }

    RawClassification::from_probabilities(normalize_probabilities(values))
}

/// Apply softmax unless the values already form a probability distribution.
fn normalize_probabilities(values: Vec<f32>) -> Vec<f32> {
    let sum: f32 = values.iter().sum();
    let in_range = values.iter().all(|p| (0.0..=1.0).contains(p));
    if in_range && (sum - 1.0).abs() <= 1e-3 {
        return values;
    }

    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Parse the `names` metadata of an Ultralytics export: `{0: 'good', 1: 'bad'}`.
pub fn parse_names_metadata(raw: &str) -> Vec<String> {
    let Ok(pattern) = regex_lite::Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#) else {
        return Vec::new();
    };

    let mut indexed: Vec<(usize, String)> = pattern
        .captures_iter(raw)
        .filter_map(|caps| {
            let index = caps.get(1)?.as_str().parse().ok()?;
            let name = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((index, name))
        })
        .collect();

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, name)| name).collect()
}

/// Parse the `imgsz` metadata (`[224, 224]`), returning the first edge.
fn parse_imgsz_metadata(raw: &str) -> Option<u32> {
    let pattern = regex_lite::Regex::new(r"\d+").ok()?;
    pattern.find(raw)?.as_str().parse().ok()
}

/// Load class names from `model_classes.json` next to the model.
fn read_classes_sidecar(model_path: &Path) -> InferenceResult<Vec<String>> {
    let sidecar = model_path.with_file_name(CLASSES_SIDECAR);
    let raw = std::fs::read_to_string(&sidecar).map_err(|e| {
        InferenceError::model_load(format!(
            "model has no class names metadata and {} is unreadable: {}",
            sidecar.display(),
            e
        ))
    })?;

    let classes: ModelClasses = serde_json::from_str(&raw).map_err(|e| {
        InferenceError::model_load(format!("Invalid {}: {}", sidecar.display(), e))
    })?;

    let names = classes.into_names();
    if names.is_empty() {
        return Err(InferenceError::model_load(format!(
            "{} lists no classes",
            sidecar.display()
        )));
    }
    Ok(names)
}

/// Class names must be unique; results are keyed by name.
fn validate_class_names(names: Vec<String>) -> InferenceResult<Vec<String>> {
    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(InferenceError::model_load(format!(
                "duplicate class name '{}' in class table",
                name
            )));
        }
    }
    Ok(names)
}

/// Create ONNX Runtime session with automatic execution provider selection.
fn create_session(model_path: &Path) -> InferenceResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| InferenceError::model_load(format!("Failed to read model file: {}", e)))?;

    let builder = Session::builder()
        .map_err(|e| InferenceError::model_load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| InferenceError::model_load(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for classification");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!("Using CoreML execution provider for classification");
                return Ok(session);
            }
        }
        debug!("CoreML execution provider not available, using CPU");
    }

    info!("Using CPU execution provider for classification");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| InferenceError::model_load(format!("Failed to load ONNX model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_metadata() {
        let names = parse_names_metadata("{0: 'good', 1: 'bad tip', 2: \"no_tip\"}");
        assert_eq!(names, vec!["good", "bad tip", "no_tip"]);
    }

    #[test]
    fn test_parse_names_metadata_numeric_order() {
        let names = parse_names_metadata("{10: 'k', 2: 'c', 0: 'a'}");
        assert_eq!(names, vec!["a", "c", "k"]);
    }

    #[test]
    fn test_parse_imgsz() {
        assert_eq!(parse_imgsz_metadata("[224, 224]"), Some(224));
        assert_eq!(parse_imgsz_metadata("none"), None);
    }

    #[test]
    fn test_postprocess_classification_vector() {
        let raw = postprocess(&[1, 3], vec![0.1, 0.7, 0.2], 3).unwrap();
        assert_eq!(raw.top1_index, 1);
        assert_eq!(raw.probabilities, vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn test_postprocess_detection_head_is_no_result() {
        assert!(postprocess(&[1, 84, 8400], vec![0.0; 84 * 8400], 3).is_none());
        assert!(postprocess(&[1, 4], vec![0.25; 4], 3).is_none());
    }

    #[test]
    fn test_logits_are_softmaxed() {
        let probs = normalize_probabilities(vec![2.0, 1.0, 0.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let err = YoloClassifier::load("/nonexistent/best.onnx").err().unwrap();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }

    #[test]
    fn test_sidecar_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("best.onnx");
        std::fs::write(
            dir.path().join(CLASSES_SIDECAR),
            r#"{"num_classes": 2, "class_names": ["good", "bad"], "class_mapping": {"0": "good", "1": "bad"}}"#,
        )
        .unwrap();
        assert_eq!(read_classes_sidecar(&model).unwrap(), vec!["good", "bad"]);
    }

    #[test]
    fn test_duplicate_class_names_rejected() {
        let err = validate_class_names(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, InferenceError::ModelLoad(_)));
        assert!(err.to_string().contains("duplicate class name 'a'"));

        let names = validate_class_names(vec!["good".into(), "bad_tip".into()]).unwrap();
        assert_eq!(names, vec!["good", "bad_tip"]);
    }

    #[test]
    #[ignore = "requires model file"]
    fn test_load_real_model() {
        let classifier = YoloClassifier::load("models/best.onnx").unwrap();
        assert!(!classifier.class_names().is_empty());
    }
}
