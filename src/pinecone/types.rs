//! Shared types used by the Pinecone client and helpers.

use crate::config::Config;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Required connection settings were missing at construction.
    #[error("Invalid vector store configuration: {0}")]
    Configuration(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store answered with a non-success status.
    #[error("Unexpected vector store response ({status}): {body}")]
    RemoteApi {
        /// HTTP status returned by the store.
        status: StatusCode,
        /// Response body, verbatim.
        body: String,
    },
    /// The store answered with a body that does not match the expected shape.
    #[error("Failed to decode vector store response: {0}")]
    Decode(String),
    /// A batch of an upsert failed; earlier batches remain written.
    #[error(
        "Upsert batch {batch} of {total_batches} failed after {committed} vectors were written: {source}"
    )]
    BatchUpsertFailed {
        /// One-based number of the failing batch.
        batch: usize,
        /// Number of batches the upsert was split into.
        total_batches: usize,
        /// Vectors durably written by the preceding batches.
        committed: usize,
        /// Failure reported for the batch.
        #[source]
        source: Box<VectorStoreError>,
    },
}

/// Connection settings for a Pinecone index.
#[derive(Debug, Clone, Default)]
pub struct PineconeSettings {
    /// API key sent in the `Api-Key` header.
    pub api_key: Option<String>,
    /// Index name.
    pub index_name: Option<String>,
    /// Project identifier used to derive the index host.
    pub project_id: Option<String>,
    /// Cloud provider used to derive the index host.
    pub cloud: String,
    /// Region used to derive the index host.
    pub region: String,
    /// Explicit host; skips derivation when present.
    pub host: Option<String>,
    /// Dimension of every vector in the index.
    pub dimension: usize,
    /// Scope every request to the `default` namespace.
    pub use_namespaces: bool,
}

impl PineconeSettings {
    /// Extract the vector store settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.pinecone_api_key.clone(),
            index_name: config.pinecone_index_name.clone(),
            project_id: config.pinecone_project_id.clone(),
            cloud: config.pinecone_cloud.clone(),
            region: config.pinecone_region.clone(),
            host: config.pinecone_host.clone(),
            dimension: config.embedding_dimension,
            use_namespaces: config.pinecone_use_namespaces,
        }
    }
}

/// A vector as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Identifier, unique across the index.
    pub id: String,
    /// Embedding values; length equals the index dimension.
    pub values: Vec<f32>,
    /// Flat filterable attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A similarity match returned by a query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Match {
    /// Identifier of the matched vector.
    pub id: String,
    /// Similarity score; higher is closer.
    pub score: f32,
    /// Metadata stored with the vector.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Outcome of a completed upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Vectors written.
    pub upserted: usize,
    /// Batches sent.
    pub batches: usize,
}

#[derive(Serialize)]
pub(crate) struct UpsertRequest<'a> {
    pub(crate) vectors: &'a [Vector],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertResponse {
    #[serde(default)]
    pub(crate) upserted_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub(crate) vector: &'a [f32],
    pub(crate) top_k: usize,
    pub(crate) include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) filter: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) namespace: Option<&'a str>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Vec<Match>,
}

#[derive(Serialize)]
pub(crate) struct DeleteRequest<'a> {
    pub(crate) ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) namespace: Option<&'a str>,
}
