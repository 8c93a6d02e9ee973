//! Source code files, read verbatim without parsing.

use super::{ContentExtractor, ExtractError, ExtractorKind, read_text};
use async_trait::async_trait;
use std::path::Path;

const CODE_EXTENSIONS: &[&str] = &[
    ".go", ".py", ".js", ".ts", ".java", ".c", ".cpp", ".h", ".rs", ".rb", ".php", ".sql",
];

/// Extractor for source code.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeExtractor;

impl CodeExtractor {
    /// Create a new code extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for CodeExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Code
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        CODE_EXTENSIONS
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        tracing::debug!(file = %path.display(), "Extracting code content");
        read_text(path).await
    }
}
