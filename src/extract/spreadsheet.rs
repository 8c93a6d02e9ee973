//! Spreadsheets: CSV is already text, binary workbooks get a placeholder.

use super::{
    ContentExtractor, ExtractError, ExtractorKind, ensure_readable, extension_of, placeholder,
    read_text,
};
use async_trait::async_trait;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xls", ".csv"];

/// Extractor for spreadsheet files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    /// Create a new spreadsheet extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for SpreadsheetExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Spreadsheet
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        SPREADSHEET_EXTENSIONS
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        tracing::debug!(file = %path.display(), "Extracting spreadsheet content");
        if extension_of(path) == ".csv" {
            return read_text(path).await;
        }
        ensure_readable(path).await?;
        Ok(placeholder("Spreadsheet", path))
    }
}
