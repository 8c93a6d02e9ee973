//! Documents, their chunks, and the processing state machine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata key holding the reason a document entered [`ProcessingState::Failed`].
pub const FAILURE_REASON_KEY: &str = "failure_reason";

/// Position of a document within the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    /// File discovered and hashed; nothing extracted yet.
    Scanned,
    /// Text content extracted.
    Extracted,
    /// Vision or classification analysis attached.
    Analyzed,
    /// Summary attached.
    Summarized,
    /// Content split into chunks.
    Chunked,
    /// Every chunk carries an embedding.
    Embedded,
    /// Vectors present in the remote index.
    Indexed,
    /// Processing stopped on an error.
    Failed,
}

const FORWARD_ORDER: [ProcessingState; 7] = [
    ProcessingState::Scanned,
    ProcessingState::Extracted,
    ProcessingState::Analyzed,
    ProcessingState::Summarized,
    ProcessingState::Chunked,
    ProcessingState::Embedded,
    ProcessingState::Indexed,
];

impl ProcessingState {
    /// Wire representation used in serialized documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scanned => "SCANNED",
            Self::Extracted => "EXTRACTED",
            Self::Analyzed => "ANALYZED",
            Self::Summarized => "SUMMARIZED",
            Self::Chunked => "CHUNKED",
            Self::Embedded => "EMBEDDED",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// `Indexed` and `Failed` accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Indexed | Self::Failed)
    }

    /// Stages that only run when a collaborator applies to the document.
    const fn is_optional(self) -> bool {
        matches!(self, Self::Analyzed | Self::Summarized)
    }

    fn rank(self) -> Option<usize> {
        FORWARD_ORDER.iter().position(|state| *state == self)
    }

    /// Whether the forward pipeline allows moving from `self` to `next`.
    ///
    /// Only optional stages may be skipped; `Failed` is handled by [`Document::fail`].
    pub fn can_advance_to(self, next: ProcessingState) -> bool {
        if self.is_terminal() {
            return false;
        }
        let (Some(from), Some(to)) = (self.rank(), next.rank()) else {
            return false;
        };
        to > from
            && FORWARD_ORDER[from + 1..to]
                .iter()
                .all(|skipped| skipped.is_optional())
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateTransitionError {
    /// The document already reached `Indexed` or `Failed`.
    #[error("document is in terminal state {0}")]
    Terminal(ProcessingState),
    /// The requested move skips a mandatory stage or goes backwards.
    #[error("invalid transition from {from} to {to}")]
    Invalid {
        /// State the document was in.
        from: ProcessingState,
        /// State that was requested.
        to: ProcessingState,
    },
}

/// A file under processing together with its derived chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: Uuid,
    /// File name without directories.
    pub file_name: String,
    /// Path the file was read from.
    pub file_path: String,
    /// Extension in leading-dot form, e.g. `.pdf`.
    pub file_type: String,
    /// Size of the file in bytes.
    pub file_size: u64,
    /// SHA-256 digest of the file bytes; the deduplication key.
    pub file_hash: String,
    /// Extracted text, empty until the document is extracted.
    pub content: String,
    /// Raw file bytes when the caller chose to retain them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<Vec<u8>>,
    /// Free-form string attributes, copied into every vector's metadata.
    pub metadata: HashMap<String, String>,
    /// Summary produced by the summarization collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Analysis produced by the vision collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_analysis: Option<String>,
    /// Current lifecycle state.
    pub processing_state: ProcessingState,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Refreshed on every state transition.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Set once, when the document reaches `Indexed`.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub indexed_at: Option<OffsetDateTime>,
    /// Chunks ordered by `chunk_index`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<Chunk>,
}

impl Document {
    /// Create a freshly scanned document.
    pub fn new(
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        file_type: impl Into<String>,
        file_size: u64,
        file_hash: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            file_path: file_path.into(),
            file_type: file_type.into(),
            file_size,
            file_hash: file_hash.into(),
            content: String::new(),
            raw_content: None,
            metadata: HashMap::new(),
            summary: None,
            vision_analysis: None,
            processing_state: ProcessingState::Scanned,
            created_at: now,
            updated_at: now,
            indexed_at: None,
            chunks: Vec::new(),
        }
    }

    /// Build a scanned document from file-system metadata.
    pub fn from_file_metadata(file: &FileMetadata) -> Self {
        let mut document = Self::new(
            file.name.clone(),
            file.path.to_string_lossy(),
            file.extension.clone(),
            file.size,
            file.hash.clone(),
        );
        document.metadata.extend(file.custom.clone());
        if !file.mime_type.is_empty() {
            document
                .metadata
                .insert("mime_type".into(), file.mime_type.clone());
        }
        document
    }

    /// Move forward in the pipeline.
    pub fn advance(&mut self, next: ProcessingState) -> Result<(), StateTransitionError> {
        let current = self.processing_state;
        if current.is_terminal() {
            return Err(StateTransitionError::Terminal(current));
        }
        if !current.can_advance_to(next) {
            return Err(StateTransitionError::Invalid {
                from: current,
                to: next,
            });
        }
        self.set_state(next);
        Ok(())
    }

    /// Jump straight to `Indexed` because the content is already in the index.
    pub fn mark_already_indexed(&mut self) -> Result<(), StateTransitionError> {
        let current = self.processing_state;
        if current.is_terminal() {
            return Err(StateTransitionError::Terminal(current));
        }
        self.set_state(ProcessingState::Indexed);
        Ok(())
    }

    /// Record a failure; the document accepts no further transitions afterwards.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), StateTransitionError> {
        let current = self.processing_state;
        if current.is_terminal() {
            return Err(StateTransitionError::Terminal(current));
        }
        self.metadata
            .insert(FAILURE_REASON_KEY.to_string(), reason.into());
        self.set_state(ProcessingState::Failed);
        Ok(())
    }

    /// Reason recorded by [`Document::fail`], if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.metadata.get(FAILURE_REASON_KEY).map(String::as_str)
    }

    /// Look up a chunk by identifier.
    pub fn chunk(&self, chunk_id: Uuid) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.id == chunk_id)
    }

    fn set_state(&mut self, next: ProcessingState) {
        let now = OffsetDateTime::now_utc();
        self.processing_state = next;
        self.updated_at = now;
        if next == ProcessingState::Indexed {
            self.indexed_at = Some(now);
        }
    }
}

/// Identifier of the vector holding a given chunk.
pub fn vector_id(document_id: Uuid, chunk_index: usize) -> String {
    format!("{document_id}#{chunk_index}")
}

/// Contiguous slice of a document's content; the unit of embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning document.
    pub document_id: Uuid,
    /// Text covered by `start_index..end_index`.
    pub content: String,
    /// Inclusive byte offset into the parent content.
    pub start_index: usize,
    /// Exclusive byte offset into the parent content.
    pub end_index: usize,
    /// Zero-based ordinal within the document.
    pub chunk_index: usize,
    /// Free-form string attributes.
    pub metadata: HashMap<String, String>,
    /// Embedding attached once the document is embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Chunk {
    /// Create a chunk covering `start_index..end_index` of the owner's content.
    pub fn new(
        document_id: Uuid,
        content: impl Into<String>,
        start_index: usize,
        end_index: usize,
        chunk_index: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            start_index,
            end_index,
            chunk_index,
            metadata: HashMap::new(),
            embedding: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Facts gathered about a file during scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Full path.
    pub path: PathBuf,
    /// File name without directories.
    pub name: String,
    /// Lower-cased extension in leading-dot form, empty when absent.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub modified_time: OffsetDateTime,
    /// SHA-256 hex digest of the content.
    pub hash: String,
    /// Best-effort MIME type guessed from the extension.
    pub mime_type: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Caller-provided attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, String>,
}
