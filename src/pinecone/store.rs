//! Storage-agnostic seam between the pipeline and the vector index.

use crate::pinecone::{Match, PineconeClient, UpsertSummary, Vector, VectorStoreError};
use async_trait::async_trait;
use serde_json::Value;

/// Operations the ingestion pipeline needs from a vector index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Dimension every stored vector must have.
    fn dimension(&self) -> usize;

    /// Write vectors; on failure, vectors from earlier batches remain written.
    async fn upsert_vectors(&self, vectors: &[Vector]) -> Result<UpsertSummary, VectorStoreError>;

    /// Nearest-neighbour query; `namespace` overrides the store's default when set.
    async fn query_vectors(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
        namespace: Option<&str>,
    ) -> Result<Vec<Match>, VectorStoreError>;

    /// Whether content with `file_hash` is indexed; failures report `false`.
    async fn check_document_exists(&self, file_hash: &str) -> bool;

    /// Remove vectors by identifier.
    async fn delete_vectors(&self, ids: &[String]) -> Result<(), VectorStoreError>;

    /// Index statistics as reported by the store.
    async fn get_stats(&self) -> Result<Value, VectorStoreError>;
}

#[async_trait]
impl VectorStore for PineconeClient {
    fn dimension(&self) -> usize {
        PineconeClient::dimension(self)
    }

    async fn upsert_vectors(&self, vectors: &[Vector]) -> Result<UpsertSummary, VectorStoreError> {
        PineconeClient::upsert_vectors(self, vectors).await
    }

    async fn query_vectors(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
        namespace: Option<&str>,
    ) -> Result<Vec<Match>, VectorStoreError> {
        PineconeClient::query_vectors_in(self, namespace, embedding, top_k, filter).await
    }

    async fn check_document_exists(&self, file_hash: &str) -> bool {
        PineconeClient::check_document_exists(self, file_hash).await
    }

    async fn delete_vectors(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        PineconeClient::delete_vectors(self, ids).await
    }

    async fn get_stats(&self) -> Result<Value, VectorStoreError> {
        PineconeClient::get_stats(self).await
    }
}
