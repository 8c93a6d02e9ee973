//! Domain entities shared by the extraction, indexing, and query paths.

pub mod document;
pub mod query;

pub use document::{
    Chunk, Document, FAILURE_REASON_KEY, FileMetadata, ProcessingState, StateTransitionError,
    vector_id,
};
pub use query::{Filter, Query, QueryResult, SearchResult};
