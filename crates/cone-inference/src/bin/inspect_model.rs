//! Print the class table of a classification model and export it as
//! `model_classes.json`.
//!
//! Usage: `inspect-model [model_path]`

use std::path::Path;

use anyhow::Context;

use cone_inference::config::DEFAULT_MODEL_PATH;
use cone_inference::{Classifier, YoloClassifier};
use cone_models::ModelClasses;

const OUTPUT_FILE: &str = "model_classes.json";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let model_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
    let model_path = Path::new(&model_path);

    println!("{}", "=".repeat(60));
    println!("Model Inspector");
    println!("{}", "=".repeat(60));

    if !model_path.exists() {
        println!("\nERROR: Model not found at {}", model_path.display());
        println!("Place the exported best.onnx in the models/ directory");
        anyhow::bail!("model not found at {}", model_path.display());
    }

    println!("\nLoading model from: {}", model_path.display());
    let classifier = YoloClassifier::load(model_path)
        .with_context(|| format!("failed to load model from {}", model_path.display()))?;
    println!("Model loaded\n");

    let class_names = classifier.class_names();
    println!("{}", "-".repeat(60));
    println!("MODEL INFORMATION");
    println!("{}", "-".repeat(60));
    println!("\nNumber of Classes: {}", class_names.len());
    println!("\nClass Names (ID -> Name):");
    for (id, name) in class_names.iter().enumerate() {
        println!("  {:2} -> {}", id, name);
    }

    println!("\nClass Names (List Format):");
    for (i, name) in class_names.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }

    println!("\nREFERENCE IMAGE SETUP");
    println!("{}", "-".repeat(60));
    println!("Create these folders in reference_images/:\n");
    for name in class_names {
        println!("  mkdir reference_images/{}", reference_folder_name(name));
    }

    println!("\nMODEL METADATA");
    println!("{}", "-".repeat(60));
    println!("Input Size: {}x{}", classifier.input_size(), classifier.input_size());
    let size_mb = std::fs::metadata(model_path)?.len() as f64 / (1024.0 * 1024.0);
    println!("File Size: {:.2} MB", size_mb);

    let classes = ModelClasses::from_names(class_names.to_vec());
    std::fs::write(OUTPUT_FILE, serde_json::to_string_pretty(&classes)?)
        .with_context(|| format!("failed to write {}", OUTPUT_FILE))?;
    println!("\nClass information exported to: {}", OUTPUT_FILE);

    println!("\n{}", "=".repeat(60));
    println!("Inspection complete");
    println!("{}", "=".repeat(60));
    Ok(())
}

fn reference_folder_name(class_name: &str) -> String {
    class_name.replace(' ', "_").to_lowercase()
}
