//! Content extraction: route a file to the extractor for its type and read its text.
//!
//! Every extractor implements [`ContentExtractor`]. The [`ExtractorRegistry`] keeps them in
//! registration order and hands a file to the first one that accepts its extension, so
//! overlapping extension sets resolve deterministically (`.csv` goes to the text extractor
//! before the spreadsheet extractor sees it).
//!
//! Binary formats without a parser yield a tagged placeholder instead of an error; ingestion
//! keeps going and the placeholder text is still indexed against the file.

mod code;
mod document;
mod image;
mod registry;
mod spreadsheet;
mod text;

pub use code::CodeExtractor;
pub use document::DocumentExtractor;
pub use image::ImageExtractor;
pub use registry::ExtractorRegistry;
pub use spreadsheet::SpreadsheetExtractor;
pub use text::TextExtractor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix carried by every placeholder extraction.
pub const PLACEHOLDER_TAG: &str = "extraction not yet implemented - placeholder";

/// Errors raised while selecting an extractor or reading a file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No registered extractor accepts the extension.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Broad family an extractor handles; drives which collaborators run afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Plain text and structured text formats.
    Text,
    /// Raster and vector images.
    Image,
    /// Office and PDF documents.
    Document,
    /// Tabular files.
    Spreadsheet,
    /// Source code.
    Code,
}

/// Capability implemented by every content extractor.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Family of files this extractor handles.
    fn kind(&self) -> ExtractorKind;

    /// Extensions in lower-case leading-dot form.
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Whether this extractor accepts the extension, compared case-insensitively.
    fn can_process(&self, extension: &str) -> bool {
        let normalized = normalize_extension(extension);
        self.supported_extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&normalized))
    }

    /// Extract text from the file at `path`.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Lower-case an extension and ensure it carries a leading dot.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with('.') {
        lowered
    } else {
        format!(".{lowered}")
    }
}

/// Extension of `path` in leading-dot form, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| normalize_extension(&ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Whether extracted text is a placeholder rather than real content.
pub fn is_placeholder(text: &str) -> bool {
    text.trim_end().ends_with(&format!(" {PLACEHOLDER_TAG})"))
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub(crate) fn placeholder(label: &str, path: &Path) -> String {
    let format = extension_of(path)
        .trim_start_matches('.')
        .to_uppercase();
    format!(
        "[{label}: {}]\n({format} {PLACEHOLDER_TAG})",
        file_name_of(path)
    )
}

pub(crate) async fn read_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| io_error(path, source))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fails when `path` is not a readable regular file.
pub(crate) async fn ensure_readable(path: &Path) -> Result<(), ExtractError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| io_error(path, source))?;
    if metadata.is_file() {
        Ok(())
    } else {
        Err(io_error(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ExtractError {
    ExtractError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_extension_adds_dot_and_lowercases() {
        assert_eq!(normalize_extension("PDF"), ".pdf");
        assert_eq!(normalize_extension(".Md"), ".md");
        assert_eq!(normalize_extension("  "), "");
    }

    #[test]
    fn extension_of_handles_missing_extension() {
        assert_eq!(extension_of(Path::new("/tmp/report.DOCX")), ".docx");
        assert_eq!(extension_of(Path::new("/tmp/Makefile")), "");
    }

    #[test]
    fn placeholder_is_tagged() {
        let text = placeholder("PDF Document", Path::new("/data/report.pdf"));
        assert_eq!(
            text,
            "[PDF Document: report.pdf]\n(PDF extraction not yet implemented - placeholder)"
        );
        assert!(is_placeholder(&text));
        assert!(is_placeholder(&placeholder("XLSX Spreadsheet", Path::new("sheet.xlsx"))));
        assert!(!is_placeholder("plain words"));
    }
}
