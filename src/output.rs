//! Saving a finished cartoon to local storage.

use crate::codec::{self, mime};
use crate::models::EncodedImage;
use crate::Result;
use std::path::{Path, PathBuf};

const DEFAULT_FILE_STEM: &str = "cartoonified-image";

/// `cartoonified-image.<ext>` with the extension taken from the media type.
pub fn default_file_name(image: &EncodedImage) -> String {
    format!(
        "{}.{}",
        DEFAULT_FILE_STEM,
        mime::extension_for_media_type(image.media_type())
    )
}

/// Decode a `data:` URI and write its bytes to `path`.
pub async fn save_data_uri(path: &Path, data_uri: &str) -> Result<PathBuf> {
    let image = codec::split_data_uri(data_uri)?;
    let bytes = image.decode()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;

    tracing::info!(
        "Saved {} ({} bytes) to {}",
        image.media_type(),
        bytes.len(),
        path.display()
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    #[test]
    fn test_default_file_name_follows_media_type() {
        let png = EncodedImage::new("image/png", "iVBORw==").unwrap();
        let jpeg = EncodedImage::new("image/jpeg", "/9j/4A==").unwrap();
        assert_eq!(default_file_name(&png), "cartoonified-image.png");
        assert_eq!(default_file_name(&jpeg), "cartoonified-image.jpg");
    }

    #[tokio::test]
    async fn test_save_data_uri_writes_decoded_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.png");

        let written = save_data_uri(&path, "data:image/png;base64,iVBORw==")
            .await
            .unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    async fn test_save_rejects_malformed_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");

        let err = save_data_uri(&path, "not a data uri").await.unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(!path.exists());
    }
}
