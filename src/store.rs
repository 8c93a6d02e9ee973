//! In-memory registry of ingested documents.
//!
//! The remote index only returns vector ids and metadata; the store lets the query path
//! resolve matches back to full [`Document`]s and [`Chunk`](crate::models::Chunk)s
//! processed by this process.

use crate::models::{Document, ProcessingState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared, cloneable document registry keyed by document id.
#[derive(Clone, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document snapshot.
    pub async fn insert(&self, document: Document) {
        self.documents.write().await.insert(document.id, document);
    }

    /// Clone out the document with `id`.
    pub async fn get(&self, id: Uuid) -> Option<Document> {
        self.documents.read().await.get(&id).cloned()
    }

    /// Remove and return the document with `id`.
    pub async fn remove(&self, id: Uuid) -> Option<Document> {
        self.documents.write().await.remove(&id)
    }

    /// First document whose content hash equals `file_hash`.
    pub async fn find_by_hash(&self, file_hash: &str) -> Option<Document> {
        self.documents
            .read()
            .await
            .values()
            .find(|document| document.file_hash == file_hash)
            .cloned()
    }

    /// Whether any document with `file_hash` reached `Indexed`, whatever its twins' states.
    pub async fn has_indexed(&self, file_hash: &str) -> bool {
        self.documents.read().await.values().any(|document| {
            document.file_hash == file_hash
                && document.processing_state == ProcessingState::Indexed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_get_and_remove() {
        let store = DocumentStore::new();
        let document = Document::new("a.txt", "/tmp/a.txt", ".txt", 3, "hash-a");
        let id = document.id;

        store.insert(document).await;
        assert_eq!(store.get(id).await.map(|doc| doc.file_name), Some("a.txt".into()));

        let removed = store.remove(id).await.expect("removed");
        assert_eq!(removed.id, id);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn find_by_hash_matches_content_key() {
        let store = DocumentStore::new();
        store
            .insert(Document::new("a.txt", "/a.txt", ".txt", 1, "h1"))
            .await;
        store
            .insert(Document::new("b.txt", "/b.txt", ".txt", 1, "h2"))
            .await;

        let found = store.find_by_hash("h2").await.expect("found");
        assert_eq!(found.file_name, "b.txt");
        assert!(store.find_by_hash("missing").await.is_none());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = DocumentStore::new();
        let clone = store.clone();
        clone
            .insert(Document::new("a.txt", "/a.txt", ".txt", 1, "h"))
            .await;
        assert!(store.find_by_hash("h").await.is_some());
    }

    #[tokio::test]
    async fn has_indexed_sees_past_failed_twins() {
        let store = DocumentStore::new();
        for index in 0..8 {
            let mut failed = Document::new(format!("f{index}.txt"), "/f.txt", ".txt", 1, "h");
            failed.fail("upsert failed").unwrap();
            store.insert(failed).await;
        }
        assert!(!store.has_indexed("h").await);

        let mut indexed = Document::new("ok.txt", "/ok.txt", ".txt", 1, "h");
        indexed.mark_already_indexed().unwrap();
        store.insert(indexed).await;

        assert!(store.has_indexed("h").await);
        assert!(!store.has_indexed("other").await);
    }
}
