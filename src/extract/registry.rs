//! Ordered registry of content extractors.

use super::{
    CodeExtractor, ContentExtractor, DocumentExtractor, ExtractError, ImageExtractor,
    SpreadsheetExtractor, TextExtractor, extension_of, normalize_extension,
};
use std::path::Path;
use std::sync::Arc;

/// Registry of content extractors, consulted in registration order.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in extractors: text, image, document, spreadsheet, code.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TextExtractor::new());
        registry.register(ImageExtractor::new());
        registry.register(DocumentExtractor::new());
        registry.register(SpreadsheetExtractor::new());
        registry.register(CodeExtractor::new());
        registry
    }

    /// Append an extractor; earlier registrations win on overlapping extensions.
    pub fn register<E: ContentExtractor + 'static>(&mut self, extractor: E) {
        self.extractors.push(Arc::new(extractor));
    }

    /// First extractor accepting `extension`.
    pub fn select(&self, extension: &str) -> Result<Arc<dyn ContentExtractor>, ExtractError> {
        let normalized = normalize_extension(extension);
        self.extractors
            .iter()
            .find(|extractor| extractor.can_process(&normalized))
            .cloned()
            .ok_or_else(|| ExtractError::UnsupportedFileType(display_extension(extension)))
    }

    /// Extract text from `path`, dispatching on its extension.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extractor = self.select(&extension_of(path))?;
        extractor.extract(path).await
    }
}

fn display_extension(extension: &str) -> String {
    if extension.trim().is_empty() {
        "<none>".to_string()
    } else {
        extension.to_string()
    }
}
