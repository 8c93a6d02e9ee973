//! Ingestion pipeline: scanning, chunking, embedding, and vector store orchestration.

pub mod chunking;
mod mappers;
pub mod scan;
mod service;
pub mod types;

pub use chunking::{TokenCounter, chunk_document, determine_chunk_size};
pub use scan::{ScanError, collect_files, scan_file, scan_paths};
pub use service::{IngestionPipeline, PipelineSettings};
pub use types::{ChunkingError, IngestOutcome, PipelineError};
