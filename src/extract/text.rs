//! Plain and structured text files, read verbatim.

use super::{ContentExtractor, ExtractError, ExtractorKind, read_text};
use async_trait::async_trait;
use std::path::Path;

const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".log", ".csv", ".json", ".yaml", ".yml", ".xml", ".toml",
];

/// Extractor for plain text files.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Text
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        TEXT_EXTENSIONS
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        tracing::debug!(file = %path.display(), "Extracting text content");
        read_text(path).await
    }
}
