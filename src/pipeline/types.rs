//! Error definitions and outcomes for the ingestion pipeline.

use crate::{
    embedding::EmbeddingClientError,
    extract::ExtractError,
    models::StateTransitionError,
    pinecone::VectorStoreError,
    summarization::SummarizationClientError,
    vision::VisionClientError,
};
use anyhow::Error as TokenizerError;
use thiserror::Error;
use uuid::Uuid;

use super::scan::ScanError;

/// Errors produced while splitting document content into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Embedding model we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the ingestion and query pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File could not be scanned.
    #[error("Failed to scan file: {0}")]
    Scan(#[from] ScanError),
    /// No extractor accepted the file or it could not be read.
    #[error("Failed to extract content: {0}")]
    Extract(#[from] ExtractError),
    /// Vision collaborator failed on an image.
    #[error("Failed to analyze image: {0}")]
    Vision(#[from] VisionClientError),
    /// Summarization collaborator failed.
    #[error("Failed to summarize: {0}")]
    Summarization(#[from] SummarizationClientError),
    /// Content could not be chunked.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store interaction failed.
    #[error("Vector store request failed: {0}")]
    VectorStore(#[from] VectorStoreError),
    /// Document lifecycle rejected a transition.
    #[error("Invalid document state: {0}")]
    State(#[from] StateTransitionError),
    /// Embedding provider returned a different number of vectors than inputs.
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch {
        /// Number of texts submitted.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },
    /// Returned embedding dimension does not match the index.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the index.
        expected: usize,
        /// Dimension produced by the provider.
        actual: usize,
    },
    /// Embedding provider returned no vector for the query.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
    /// A chunk reached indexing without an embedding.
    #[error("Chunk {chunk_index} has no embedding")]
    MissingEmbedding {
        /// Ordinal of the offending chunk.
        chunk_index: usize,
    },
    /// No document with the identifier is known locally.
    #[error("Unknown document: {0}")]
    DocumentNotFound(Uuid),
}

/// How a successful ingestion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Content was chunked, embedded, and written to the index.
    Indexed {
        /// Chunks produced for the document.
        chunks: usize,
        /// Vectors written to the store.
        vectors: usize,
    },
    /// The index already held content with the same hash; nothing was written.
    AlreadyIndexed,
}
