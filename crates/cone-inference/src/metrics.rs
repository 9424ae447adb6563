//! Inference metrics.
//!
//! Recorded through the `metrics` facade; the HTTP server installs the
//! Prometheus recorder, elsewhere these calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const INFERENCE_DURATION_SECONDS: &str = "cone_inference_duration_seconds";
    pub const CLASSIFICATIONS_TOTAL: &str = "cone_classifications_total";
    pub const UNCLASSIFIED_TOTAL: &str = "cone_unclassified_total";
    pub const INFERENCE_FAILURES_TOTAL: &str = "cone_inference_failures_total";
    pub const BASE64_UPLOADS_TOTAL: &str = "cone_base64_uploads_total";
}

/// Record the duration of one classify call.
pub fn record_inference_duration(duration_secs: f64) {
    histogram!(names::INFERENCE_DURATION_SECONDS).record(duration_secs);
}

/// Record a classified image.
pub fn record_classification(class_name: &str) {
    let labels = [("class", class_name.to_string())];
    counter!(names::CLASSIFICATIONS_TOTAL, &labels).increment(1);
}

/// Record a classify call that produced no result.
pub fn record_unclassified() {
    counter!(names::UNCLASSIFIED_TOTAL).increment(1);
}

/// Record a failed pipeline call.
pub fn record_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::INFERENCE_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a base64 upload.
pub fn record_base64_upload() {
    counter!(names::BASE64_UPLOADS_TOTAL).increment(1);
}
