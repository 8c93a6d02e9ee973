//! Query-side types: user queries, filters, and assembled results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// A retrieval request against the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Unique identifier echoed in the result.
    pub id: Uuid,
    /// Free text to embed.
    pub text: String,
    /// Number of nearest neighbours requested.
    pub top_k: usize,
    /// Namespace override; the adapter's configured namespace applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Metadata constraints applied by the vector store.
    #[serde(default)]
    pub filter: Filter,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Query {
    /// Create a query with no filter and the default namespace.
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            top_k,
            namespace: None,
            filter: Filter::default(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Target a specific namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Constraints on which chunks a query may return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Exact file type (leading-dot extension).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Inclusive lower bound on the document creation time.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_from: Option<OffsetDateTime>,
    /// Inclusive upper bound on the document creation time.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_to: Option<OffsetDateTime>,
    /// Exact-match constraints on arbitrary metadata keys.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Filter {
    /// `true` when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.file_type.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.metadata.is_empty()
    }
}

/// Answer to a query along with its supporting chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Identifier of the originating query.
    pub query_id: Uuid,
    /// Generated answer; empty when no answering collaborator is configured.
    pub answer: String,
    /// Supporting chunks in the store's ranking order.
    pub sources: Vec<SearchResult>,
    /// Assembly timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A vector-store match joined back to its document and chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Owning document.
    pub document_id: Uuid,
    /// Matched chunk.
    pub chunk_id: Uuid,
    /// Similarity score reported by the store.
    pub score: f32,
    /// Chunk text.
    pub content: String,
    /// Owning document's file name.
    pub file_name: String,
    /// Owning document's path.
    pub file_path: String,
    /// Owning document's file type.
    pub file_type: String,
    /// Remaining string metadata stored with the vector.
    pub metadata: HashMap<String, String>,
}
