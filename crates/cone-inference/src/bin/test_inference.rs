//! Classify one image through the pipeline and print the result.
//!
//! Usage: `test-inference <image_path> [model_path]`

use anyhow::Context;

use cone_inference::config::DEFAULT_MODEL_PATH;
use cone_inference::{InferenceConfig, InferencePipeline};
use cone_models::ClassifyResponse;

const BAR_WIDTH: usize = 40;

/// Minimum confidence reported by this tool.
const CONFIDENCE_THRESHOLD: f32 = 0.7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(image_path) = args.next() else {
        println!("No test image provided");
        println!("\nUsage: test-inference <image_path> [model_path]");
        println!("Example: test-inference ../uploads/test_cone.jpg");
        return Ok(());
    };
    let model_path = args.next().unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());

    println!("{}", "=".repeat(60));
    println!("Inference Test");
    println!("{}", "=".repeat(60));

    // Paths given on the command line are relative to where the tool runs.
    let config = InferenceConfig::from_env()
        .with_model_path(&model_path)
        .with_project_root(std::env::current_dir()?);
    let pipeline = InferencePipeline::new(config);

    println!("\nLoading model: {}", model_path);
    let info = pipeline.model_info().await?;
    println!("Model loaded\n");
    println!("Model Classes:");
    for (id, name) in info.classes.iter().enumerate() {
        println!("  {}: {}", id, name);
    }

    println!("\nLoading image: {}", image_path);
    let (width, height) = image::image_dimensions(&image_path)
        .with_context(|| format!("failed to read image {}", image_path))?;
    println!("Image loaded: {}x{} pixels\n", width, height);

    println!("Running inference...");
    let response = pipeline
        .classify_image(&image_path, CONFIDENCE_THRESHOLD)
        .await?;

    let result = match &response {
        ClassifyResponse::Classified(result) => result,
        ClassifyResponse::Unclassified(unclassified) => {
            println!("\n{}", unclassified.error);
            println!("This might not be a classification model");
            return Ok(());
        }
    };
    println!("Inference complete in {}ms\n", result.inference_time_ms);

    println!("{}", "-".repeat(60));
    println!("CLASSIFICATION RESULTS");
    println!("{}", "-".repeat(60));
    println!("\nPredicted Class: {}", result.predicted_class);
    println!("   Confidence: {:.2}%", result.confidence * 100.0);
    println!("   Inference Time: {}ms", result.inference_time_ms);

    println!("\nAll Class Probabilities:");
    println!("{}", "-".repeat(60));
    for ranked in result.all_classes.ranked(result.all_classes.len()) {
        println!(
            "  {:20} {} {:5.2}%",
            ranked.class_name,
            probability_bar(ranked.confidence),
            ranked.confidence * 100.0
        );
    }

    println!("\nJSON Response (API Format):");
    println!("{}", "-".repeat(60));
    println!("{}", serde_json::to_string_pretty(&response)?);

    println!("\n{}", "=".repeat(60));
    println!("Test complete");
    println!("{}", "=".repeat(60));
    Ok(())
}

fn probability_bar(probability: f32) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * BAR_WIDTH as f32) as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
