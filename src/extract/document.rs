//! PDF and office documents. No parser is wired in yet, so every format yields a tagged
//! placeholder naming the file.

use super::{ContentExtractor, ExtractError, ExtractorKind, ensure_readable, extension_of, placeholder};
use async_trait::async_trait;
use std::path::Path;

const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc", ".pptx", ".ppt", ".odt"];

/// Extractor for PDF, Word, PowerPoint, and OpenDocument files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Create a new document extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for DocumentExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Document
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        DOCUMENT_EXTENSIONS
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        tracing::debug!(file = %path.display(), "Extracting document content");
        ensure_readable(path).await?;

        let extension = extension_of(path);
        let label = match extension.as_str() {
            ".pdf" => "PDF Document",
            ".docx" => "DOCX Document",
            ".doc" => "DOC Document",
            ".pptx" => "PPTX Presentation",
            ".ppt" => "PPT Presentation",
            _ => "Document",
        };
        Ok(placeholder(label, path))
    }
}
