//! Base64 image ingestion.
//!
//! Decoded payloads are written to uniquely named temporary files that are
//! removed when the returned [`TempImage`] is dropped.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{InferenceError, InferenceResult};

const TEMP_PREFIX: &str = "cone_upload_";

/// A decoded image on disk, deleted on drop.
#[derive(Debug)]
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Decode a base64 payload, tolerating a `data:<mime>;base64,` prefix and
/// embedded whitespace.
pub fn decode_image_base64(data: &str) -> InferenceResult<Vec<u8>> {
    let payload = match data.trim_start().strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, encoded)) => encoded,
            None => {
                return Err(InferenceError::invalid_request(
                    "data URL is missing its payload",
                ))
            }
        },
        None => data,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(InferenceError::invalid_request("empty image payload"));
    }

    Ok(STANDARD.decode(compact.as_bytes())?)
}

/// Decode `data` and write it to a temporary image file.
///
/// The file is created in `temp_dir`, or the system temp dir when `None`.
pub async fn write_temp_image(data: &str, temp_dir: Option<&Path>) -> InferenceResult<TempImage> {
    let bytes = decode_image_base64(data)?;
    let format = image::guess_format(&bytes)
        .map_err(|e| InferenceError::InvalidImage(e.to_string()))?;
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let suffix = format!(".{}", extension);

    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX).suffix(&suffix);
    let file = match temp_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };

    tokio::fs::write(file.path(), &bytes).await?;
    debug!(
        path = %file.path().display(),
        bytes = bytes.len(),
        format = ?format,
        "Wrote temporary image"
    );

    Ok(TempImage { file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_base64() -> String {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_strips_data_url_and_whitespace() {
        let encoded = STANDARD.encode(b"hello");
        let wrapped = format!("data:image/png;base64,{}\n", &encoded[..4]) + &encoded[4..];
        assert_eq!(decode_image_base64(&wrapped).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode_image_base64("not base64!!").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidBase64(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            decode_image_base64("  "),
            Err(InferenceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_temp_image_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let image = write_temp_image(&png_base64(), Some(dir.path())).await.unwrap();
        let path = image.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_PREFIX));

        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_non_image_bytes_leave_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let payload = STANDARD.encode(b"plain text, not an image");

        let err = write_temp_image(&payload, Some(dir.path())).await.unwrap_err();
        assert!(matches!(err, InferenceError::InvalidImage(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unique_names() {
        let dir = TempDir::new().unwrap();
        let data = png_base64();
        let a = write_temp_image(&data, Some(dir.path())).await.unwrap();
        let b = write_temp_image(&data, Some(dir.path())).await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
