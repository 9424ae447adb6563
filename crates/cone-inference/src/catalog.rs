//! Reference image catalog.
//!
//! The catalog is a directory tree one level deep: each subdirectory is a
//! class label and holds example images for that class. It is rescanned on
//! every call.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use cone_models::{ReferenceCatalog, ReferenceImage};

use crate::error::InferenceResult;

/// File extensions recognised as reference images (case-insensitive).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether `path` has a reference image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// List every reference image under `dir`.
///
/// A missing directory is created and yields an empty catalog. Files at the
/// top level and nested deeper than one subdirectory are ignored.
pub async fn list_reference_images(dir: &Path) -> InferenceResult<ReferenceCatalog> {
    if !fs::try_exists(dir).await? {
        fs::create_dir_all(dir).await?;
        info!("Created reference images directory {}", dir.display());
        return Ok(ReferenceCatalog::default());
    }

    let mut images = Vec::new();
    let mut classes = fs::read_dir(dir).await?;
    while let Some(class_entry) = classes.next_entry().await? {
        let class_path = class_entry.path();
        // Follows symlinks.
        if !fs::metadata(&class_path).await.map(|m| m.is_dir()).unwrap_or(false) {
            continue;
        }
        let class_name = class_entry.file_name().to_string_lossy().into_owned();

        let mut files = fs::read_dir(&class_path).await?;
        while let Some(file_entry) = files.next_entry().await? {
            let file_path = file_entry.path();
            if !is_image_file(&file_path) {
                continue;
            }
            if !fs::metadata(&file_path).await.map(|m| m.is_file()).unwrap_or(false) {
                continue;
            }

            images.push(ReferenceImage {
                class_name: class_name.clone(),
                filename: file_entry.file_name().to_string_lossy().into_owned(),
                path: file_path.display().to_string(),
            });
        }
    }

    debug!(count = images.len(), "Listed reference images in {}", dir.display());
    Ok(ReferenceCatalog::new(images))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.JPEG")));
        assert!(is_image_file(Path::new("dir/a.Png")));
        assert!(!is_image_file(Path::new("a.gif")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[tokio::test]
    async fn test_missing_dir_is_created() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("reference_images");

        let catalog = list_reference_images(&dir).await.unwrap();
        assert_eq!(catalog.count, 0);
        assert!(catalog.reference_images.is_empty());
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_lists_one_level_deep() {
        let root = TempDir::new().unwrap();
        let dir = root.path();
        std::fs::create_dir_all(dir.join("good/nested")).unwrap();
        std::fs::create_dir_all(dir.join("bad_tip")).unwrap();
        std::fs::write(dir.join("good/a.jpg"), b"x").unwrap();
        std::fs::write(dir.join("good/b.PNG"), b"x").unwrap();
        std::fs::write(dir.join("good/notes.txt"), b"x").unwrap();
        std::fs::write(dir.join("good/nested/deep.jpg"), b"x").unwrap();
        std::fs::write(dir.join("bad_tip/c.jpeg"), b"x").unwrap();
        std::fs::write(dir.join("top.jpg"), b"x").unwrap();

        let catalog = list_reference_images(dir).await.unwrap();
        assert_eq!(catalog.count, 3);

        let mut good: Vec<_> = catalog
            .for_class("good")
            .into_iter()
            .map(|r| r.filename)
            .collect();
        good.sort();
        assert_eq!(good, vec!["a.jpg", "b.PNG"]);

        let bad = catalog.for_class("bad_tip");
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].path, dir.join("bad_tip/c.jpeg").display().to_string());
    }
}
