#![deny(missing_docs)]

//! Core library for ragdex, a document ingestion and vector indexing pipeline.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Content extraction by file type.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Documents, chunks, queries, and their lifecycle.
pub mod models;
/// Pinecone vector store integration.
pub mod pinecone;
/// Document ingestion and query orchestration.
pub mod pipeline;
/// In-memory document registry.
pub mod store;
/// Summary and answer generation.
pub mod summarization;
/// Image analysis collaborator.
pub mod vision;
