//! Model metadata models.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Model family reported by the info endpoints.
pub const MODEL_TYPE: &str = "YOLOv8 Classification";

/// Snapshot of the loaded model, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Configured model path
    pub path: String,
    /// Class names in class-index order
    pub classes: Vec<String>,
}

impl ModelInfo {
    pub fn new(path: impl Into<String>, classes: Vec<String>) -> Self {
        Self {
            path: path.into(),
            classes,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// File name of the model, used as the result's `model_version`.
    pub fn version(&self) -> String {
        std::path::Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }

    /// Index -> name table.
    pub fn class_mapping(&self) -> ClassMapping {
        ClassMapping(self.classes.clone())
    }

    /// The exported class table written by `inspect-model`.
    pub fn to_model_classes(&self) -> ModelClasses {
        ModelClasses::from_names(self.classes.clone())
    }
}

/// Index -> class name table, serialized as `{"0": "good", "1": "bad"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMapping(pub Vec<String>);

impl Serialize for ClassMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, name) in self.0.iter().enumerate() {
            map.serialize_entry(&index.to_string(), name)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, String> = BTreeMap::deserialize(deserializer)?;
        let mut indexed = Vec::with_capacity(raw.len());
        for (key, name) in raw {
            let index: usize = key
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid class index: {}", key)))?;
            indexed.push((index, name));
        }
        indexed.sort_by_key(|(index, _)| *index);
        Ok(ClassMapping(indexed.into_iter().map(|(_, name)| name).collect()))
    }
}

/// Class table persisted as `model_classes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelClasses {
    pub num_classes: usize,
    pub class_names: Vec<String>,
    pub class_mapping: ClassMapping,
}

impl ModelClasses {
    pub fn from_names(class_names: Vec<String>) -> Self {
        Self {
            num_classes: class_names.len(),
            class_mapping: ClassMapping(class_names.clone()),
            class_names,
        }
    }

    /// Class names in index order, preferring the explicit list.
    pub fn into_names(self) -> Vec<String> {
        if self.class_names.is_empty() {
            self.class_mapping.0
        } else {
            self.class_names
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        (0..11).map(|i| format!("class_{}", i)).collect()
    }

    #[test]
    fn test_class_mapping_numeric_order() {
        let json = serde_json::to_string(&ClassMapping(names())).unwrap();
        let parsed: ClassMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.0[2], "class_2");
        assert_eq!(parsed.0[10], "class_10");
    }

    #[test]
    fn test_class_mapping_rejects_bad_index() {
        assert!(serde_json::from_str::<ClassMapping>(r#"{"one": "a"}"#).is_err());
    }

    #[test]
    fn test_model_classes_shape() {
        let classes = ModelClasses::from_names(vec!["good".into(), "bad tip".into()]);
        let value = serde_json::to_value(&classes).unwrap();
        assert_eq!(value["num_classes"], 2);
        assert_eq!(value["class_names"][1], "bad tip");
        assert_eq!(value["class_mapping"]["0"], "good");
    }

    #[test]
    fn test_model_version_is_file_name() {
        let info = ModelInfo::new("./models/best.onnx", vec!["a".into()]);
        assert_eq!(info.version(), "best.onnx");
        assert_eq!(info.num_classes(), 1);
    }
}
