//! File discovery and content hashing.

use crate::extract::extension_of;
use crate::models::FileMetadata;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use walkdir::WalkDir;

/// Errors raised while scanning the file system.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A file or directory could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Directory traversal failed.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// SHA-256 digest of `bytes`, hex encoded.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Best-effort MIME type for a leading-dot extension.
pub fn guess_mime_type(extension: &str) -> &'static str {
    match extension {
        ".txt" | ".log" => "text/plain",
        ".md" => "text/markdown",
        ".csv" => "text/csv",
        ".json" => "application/json",
        ".yaml" | ".yml" => "application/yaml",
        ".xml" => "application/xml",
        ".toml" => "application/toml",
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".svg" => "image/svg+xml",
        ".webp" => "image/webp",
        ".pdf" => "application/pdf",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".doc" => "application/msword",
        ".pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".ppt" => "application/vnd.ms-powerpoint",
        ".odt" => "application/vnd.oasis.opendocument.text",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xls" => "application/vnd.ms-excel",
        ".go" | ".py" | ".js" | ".ts" | ".java" | ".c" | ".cpp" | ".h" | ".rs" | ".rb"
        | ".php" | ".sql" => "text/x-source",
        _ => "application/octet-stream",
    }
}

/// Read, hash, and describe a single file.
pub async fn scan_file(path: &Path) -> Result<FileMetadata, ScanError> {
    let io_error = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
    let bytes = tokio::fs::read(path).await.map_err(io_error)?;
    let modified_time = metadata
        .modified()
        .map(OffsetDateTime::from)
        .unwrap_or_else(|_| OffsetDateTime::now_utc());
    let extension = extension_of(path);

    Ok(FileMetadata {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime_type: guess_mime_type(&extension).to_string(),
        extension,
        size: metadata.len(),
        modified_time,
        hash: hash_bytes(&bytes),
        is_directory: metadata.is_dir(),
        custom: HashMap::new(),
    })
}

/// Expand `paths` into the regular files they name, descending into directories.
///
/// Directory entries are returned in file-name order; hidden entries are skipped.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Scan every file under `paths`.
pub async fn scan_paths(paths: &[PathBuf]) -> Result<Vec<FileMetadata>, ScanError> {
    let mut scanned = Vec::new();
    for file in collect_files(paths)? {
        scanned.push(scan_file(&file).await?);
    }
    tracing::debug!(files = scanned.len(), "Scanned input paths");
    Ok(scanned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_is_sha256_hex() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn scan_file_describes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.MD");
        std::fs::write(&path, "abc").unwrap();

        let file = scan_file(&path).await.expect("scanned");
        assert_eq!(file.name, "Notes.MD");
        assert_eq!(file.extension, ".md");
        assert_eq!(file.mime_type, "text/markdown");
        assert_eq!(file.size, 3);
        assert_eq!(file.hash, hash_bytes(b"abc"));
        assert!(!file.is_directory);
    }

    #[tokio::test]
    async fn scan_file_reports_missing_path() {
        let error = scan_file(Path::new("/definitely/missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(error, ScanError::Io { .. }));
    }

    #[test]
    fn collect_files_walks_directories_in_order_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("nested/c.rs"), "c").unwrap();
        std::fs::write(dir.path().join(".git/config"), "x").unwrap();
        std::fs::write(dir.path().join(".env"), "x").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("nested/c.rs"),
            ]
        );
    }
}
