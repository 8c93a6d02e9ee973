use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_indexed: AtomicU64,
    documents_deduplicated: AtomicU64,
    documents_failed: AtomicU64,
    chunks_indexed: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document whose chunks were written to the vector store.
    pub fn record_indexed(&self, chunk_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a document skipped because its content hash was already indexed.
    pub fn record_deduplicated(&self) {
        self.documents_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document that ended in the failed state.
    pub fn record_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_deduplicated: self.documents_deduplicated.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents whose vectors were upserted since startup.
    pub documents_indexed: u64,
    /// Documents short-circuited by the existence check.
    pub documents_deduplicated: u64,
    /// Documents that ended in the failed state.
    pub documents_failed: u64,
    /// Total chunk count written across all indexed documents.
    pub chunks_indexed: u64,
}
