//! Images: emit a marker and leave the real analysis to the vision collaborator.

use super::{ContentExtractor, ExtractError, ExtractorKind, ensure_readable, file_name_of};
use async_trait::async_trait;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".svg", ".webp"];

/// Extractor for image files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageExtractor;

impl ImageExtractor {
    /// Create a new image extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for ImageExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Image
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        IMAGE_EXTENSIONS
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        tracing::debug!(file = %path.display(), "Image file detected");
        ensure_readable(path).await?;
        Ok(format!("[IMAGE FILE: {}]", file_name_of(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_marker_with_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.PNG");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let text = ImageExtractor::new().extract(&path).await.unwrap();
        assert_eq!(text, "[IMAGE FILE: diagram.PNG]");
    }

    #[tokio::test]
    async fn missing_image_is_io_error() {
        let error = ImageExtractor::new()
            .extract(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractError::Io { .. }));
    }
}
