//! Image path resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{InferenceError, InferenceResult};

/// Resolve a caller-supplied image path against the project root.
///
/// Absolute paths are returned unchanged whether or not they exist; relative
/// paths are joined onto `project_root`.
pub fn resolve_image_path(raw: &str, project_root: &Path) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        if !candidate.exists() {
            debug!(path = %candidate.display(), "Absolute image path does not exist");
        }
        return candidate.to_path_buf();
    }

    project_root.join(candidate)
}

/// Resolve `raw` and check that the file exists.
pub fn resolve_existing_image(raw: &str, project_root: &Path) -> InferenceResult<PathBuf> {
    let resolved = resolve_image_path(raw, project_root);
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(InferenceError::ImageNotFound(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_existing_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("cone.jpg");
        std::fs::write(&image, b"jpg").unwrap();

        let raw = image.to_str().unwrap();
        assert_eq!(resolve_image_path(raw, Path::new("/elsewhere")), image);
        assert_eq!(resolve_existing_image(raw, Path::new("/elsewhere")).unwrap(), image);
    }

    #[test]
    fn test_absolute_missing_passes_through() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.jpg");
        let raw = missing.to_str().unwrap();

        assert_eq!(resolve_image_path(raw, Path::new("/root")), missing);
        match resolve_existing_image(raw, Path::new("/root")) {
            Err(InferenceError::ImageNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected ImageNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_joins_project_root() {
        assert_eq!(
            resolve_image_path("x/y.jpg", Path::new("/root")),
            PathBuf::from("/root/x/y.jpg")
        );
    }

    #[test]
    fn test_relative_existing_under_root() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("uploads")).unwrap();
        std::fs::write(root.path().join("uploads/a.png"), b"png").unwrap();

        let resolved = resolve_existing_image("uploads/a.png", root.path()).unwrap();
        assert_eq!(resolved, root.path().join("uploads/a.png"));
    }

    #[test]
    fn test_not_found_reports_resolved_path() {
        let err = resolve_existing_image("x/y.jpg", Path::new("/nonexistent-root")).unwrap_err();
        assert_eq!(err.to_string(), "Image not found: /nonexistent-root/x/y.jpg");
    }
}
