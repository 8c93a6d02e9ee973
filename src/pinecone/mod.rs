//! Pinecone vector store integration.

pub mod client;
pub mod filters;
pub mod store;
pub mod types;

pub use client::{DEFAULT_NAMESPACE, PineconeClient, UPSERT_BATCH_SIZE};
pub use filters::{build_query_filter, file_hash_filter};
pub use store::VectorStore;
pub use types::{Match, PineconeSettings, UpsertSummary, Vector, VectorStoreError};
