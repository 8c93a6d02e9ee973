//! Ingestion pipeline coordinating extraction, enrichment, chunking, embedding, and indexing.

use crate::{
    config::Config,
    embedding::{EmbeddingClient, get_embedding_client},
    extract::{ExtractorKind, ExtractorRegistry, extension_of, is_placeholder},
    metrics::{MetricsSnapshot, PipelineMetrics},
    models::{Document, ProcessingState, Query, QueryResult, StateTransitionError},
    pinecone::{PineconeClient, PineconeSettings, VectorStore, build_query_filter},
    pipeline::{
        chunking::{TokenCounter, build_token_counter, chunk_document, determine_chunk_size},
        mappers::{build_vectors, map_match, match_document_id, vector_ids},
        scan::scan_file,
        types::{IngestOutcome, PipelineError},
    },
    store::DocumentStore,
    summarization::{
        SummarizationClient, SummarizationRequest, answer_prompt, document_summary_prompt,
        get_summarization_client,
    },
    vision::{OllamaVisionClient, VisionClient},
};
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

const SUMMARY_MAX_WORDS: usize = 120;
const ANSWER_MAX_WORDS: usize = 200;

type SharedEmbedder = Arc<dyn EmbeddingClient + Send + Sync>;
type SharedSummarizer = Arc<dyn SummarizationClient + Send + Sync>;
type SharedVision = Arc<dyn VisionClient + Send + Sync>;

/// Tunables applied by the pipeline.
#[derive(Clone)]
pub struct PipelineSettings {
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Words repeated between adjacent chunks.
    pub chunk_overlap: usize,
    /// Counter measuring chunk cost.
    pub token_counter: TokenCounter,
    /// Model passed to the summarization collaborator.
    pub summarization_model: String,
    /// Result count used when a query asks for zero results.
    pub default_top_k: usize,
    /// Upper bound on requested result counts.
    pub max_top_k: usize,
}

impl PipelineSettings {
    /// Derive settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let chunk_size = determine_chunk_size(
            config.text_splitter_chunk_size,
            config.embedding_provider,
            &config.embedding_model,
        );
        tracing::debug!(
            chunk_size,
            chunk_size_override = config.text_splitter_chunk_size,
            provider = ?config.embedding_provider,
            model = %config.embedding_model,
            overlap = config.text_splitter_chunk_overlap,
            "Derived chunk size"
        );
        Ok(Self {
            chunk_size,
            chunk_overlap: config.text_splitter_chunk_overlap,
            token_counter: build_token_counter(config.embedding_provider, &config.embedding_model)?,
            summarization_model: config.summarization_model.clone(),
            default_top_k: config.search_default_top_k.max(1),
            max_top_k: config.search_max_top_k.max(1),
        })
    }
}

/// Drives documents from `Scanned` to `Indexed` (or `Failed`) and answers queries.
///
/// Construct once near process start; every method takes `&self` so the pipeline can be
/// shared through an `Arc`. Each [`Document`] is mutated by one ingestion at a time.
pub struct IngestionPipeline {
    registry: Arc<ExtractorRegistry>,
    embedding_client: SharedEmbedder,
    summarizer: Option<SharedSummarizer>,
    vision: Option<SharedVision>,
    store: Arc<dyn VectorStore>,
    documents: DocumentStore,
    metrics: Arc<PipelineMetrics>,
    settings: PipelineSettings,
}

impl IngestionPipeline {
    /// Pipeline with the default extractors and no optional collaborators.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedding_client: SharedEmbedder,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry: Arc::new(ExtractorRegistry::with_defaults()),
            embedding_client,
            summarizer: None,
            vision: None,
            store,
            documents: DocumentStore::new(),
            metrics: Arc::new(PipelineMetrics::new()),
            settings,
        }
    }

    /// Build the pipeline and its collaborators from configuration over one HTTP client.
    pub fn from_config(config: &Config, http: Client) -> Result<Self, PipelineError> {
        let store = PineconeClient::new(&PineconeSettings::from_config(config), http.clone())?;
        tracing::info!("Initializing embedding client");
        let embedding_client: SharedEmbedder =
            Arc::from(get_embedding_client(config, http.clone()));
        let mut pipeline = Self::new(
            Arc::new(store),
            embedding_client,
            PipelineSettings::from_config(config)?,
        );

        if let Some(summarizer) = get_summarization_client(config, http.clone()) {
            tracing::info!(model = %config.summarization_model, "Summarization enabled");
            let summarizer: SharedSummarizer = Arc::from(summarizer);
            pipeline = pipeline.with_summarizer(summarizer);
        }
        if let Some(model) = &config.vision_model {
            tracing::info!(model = %model, "Vision analysis enabled");
            pipeline = pipeline.with_vision(Arc::new(OllamaVisionClient::new(
                http,
                config.ollama_url.clone(),
                model.clone(),
            )));
        }
        Ok(pipeline)
    }

    /// Replace the extractor registry.
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Enable the `Summarized` stage and generated query answers.
    pub fn with_summarizer(mut self, summarizer: SharedSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Enable the `Analyzed` stage for images.
    pub fn with_vision(mut self, vision: SharedVision) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Documents processed by this pipeline.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Current ingestion counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Index statistics reported by the vector store.
    pub async fn stats(&self) -> Result<Value, PipelineError> {
        Ok(self.store.get_stats().await?)
    }

    /// Scan the file at `path` and ingest it.
    ///
    /// Once scanned, the document is kept in [`IngestionPipeline::documents`] whatever the
    /// outcome.
    pub async fn ingest_path(
        &self,
        path: &Path,
    ) -> Result<(Document, IngestOutcome), PipelineError> {
        let file = scan_file(path).await?;
        let mut document = Document::from_file_metadata(&file);
        let outcome = self.ingest(&mut document).await?;
        Ok((document, outcome))
    }

    /// Move a document through the pipeline.
    ///
    /// Content already present in the index (by `file_hash`) short-circuits to `Indexed`
    /// without extraction, embedding, or upload. Any error leaves the document `Failed`
    /// with the reason under `metadata["failure_reason"]`.
    pub async fn ingest(&self, document: &mut Document) -> Result<IngestOutcome, PipelineError> {
        if document.processing_state.is_terminal() {
            return Err(StateTransitionError::Terminal(document.processing_state).into());
        }
        tracing::info!(
            document_id = %document.id,
            file = %document.file_path,
            hash = %document.file_hash,
            "Ingesting document"
        );

        let result = self.run(document).await;
        match &result {
            Ok(IngestOutcome::Indexed { chunks, vectors }) => {
                self.metrics.record_indexed(*chunks as u64);
                tracing::info!(
                    document_id = %document.id,
                    chunks,
                    vectors,
                    "Document indexed"
                );
            }
            Ok(IngestOutcome::AlreadyIndexed) => {
                self.metrics.record_deduplicated();
                tracing::info!(
                    document_id = %document.id,
                    hash = %document.file_hash,
                    "Content already indexed; skipping"
                );
            }
            Err(error) => {
                let stage = document.processing_state;
                if let Err(transition) = document.fail(error.to_string()) {
                    tracing::debug!(error = %transition, "Document already terminal");
                }
                self.metrics.record_failed();
                tracing::warn!(
                    document_id = %document.id,
                    stage = %stage,
                    error = %error,
                    "Document failed"
                );
            }
        }
        self.documents.insert(document.clone()).await;
        result
    }

    async fn run(&self, document: &mut Document) -> Result<IngestOutcome, PipelineError> {
        if self.is_indexed(&document.file_hash).await {
            document.mark_already_indexed()?;
            return Ok(IngestOutcome::AlreadyIndexed);
        }

        let path = PathBuf::from(&document.file_path);
        let extension = if document.file_type.is_empty() {
            extension_of(&path)
        } else {
            document.file_type.clone()
        };
        let extractor = self.registry.select(&extension)?;
        document.content = extractor.extract(&path).await?;
        document.advance(ProcessingState::Extracted)?;
        tracing::debug!(
            document_id = %document.id,
            kind = ?extractor.kind(),
            bytes = document.content.len(),
            "Extracted content"
        );

        if let Some(vision) = self
            .vision
            .as_ref()
            .filter(|_| extractor.kind() == ExtractorKind::Image)
        {
            let analysis = vision.analyze_image(&path).await?;
            document
                .content
                .push_str(&format!("\n\n[Image analysis]\n{analysis}"));
            document.vision_analysis = Some(analysis);
            document.advance(ProcessingState::Analyzed)?;
        }

        let summarizable =
            !document.content.trim().is_empty() && !is_placeholder(&document.content);
        if let Some(summarizer) = self.summarizer.as_ref().filter(|_| summarizable) {
            let summary = summarizer
                .generate_summary(SummarizationRequest {
                    model: self.settings.summarization_model.clone(),
                    prompt: document_summary_prompt(
                        &document.file_name,
                        &document.content,
                        SUMMARY_MAX_WORDS,
                    ),
                    max_words: SUMMARY_MAX_WORDS,
                })
                .await?;
            document.summary = Some(summary);
            document.advance(ProcessingState::Summarized)?;
        }

        document.chunks = chunk_document(
            document,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
            &self.settings.token_counter,
        )?;
        document.advance(ProcessingState::Chunked)?;

        if document.chunks.is_empty() {
            tracing::warn!(document_id = %document.id, "Document has no content to embed");
        } else {
            self.embed_chunks(document).await?;
        }
        document.advance(ProcessingState::Embedded)?;

        let vectors = build_vectors(document)?;
        let summary = self.store.upsert_vectors(&vectors).await?;
        document.advance(ProcessingState::Indexed)?;

        Ok(IngestOutcome::Indexed {
            chunks: document.chunks.len(),
            vectors: summary.upserted,
        })
    }

    async fn is_indexed(&self, file_hash: &str) -> bool {
        if self.store.check_document_exists(file_hash).await {
            return true;
        }
        self.documents.has_indexed(file_hash).await
    }

    async fn embed_chunks(&self, document: &mut Document) -> Result<(), PipelineError> {
        let texts: Vec<String> = document
            .chunks
            .iter()
            .map(|chunk| chunk.content.clone())
            .collect();
        let embeddings = self.embedding_client.generate_embeddings(texts).await?;
        if embeddings.len() != document.chunks.len() {
            return Err(PipelineError::EmbeddingCountMismatch {
                expected: document.chunks.len(),
                actual: embeddings.len(),
            });
        }

        let expected = self.store.dimension();
        for (chunk, embedding) in document.chunks.iter_mut().zip(embeddings) {
            if embedding.len() != expected {
                return Err(PipelineError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            chunk.embedding = Some(embedding);
        }
        tracing::debug!(
            document_id = %document.id,
            chunks = document.chunks.len(),
            "Embedded chunks"
        );
        Ok(())
    }

    /// Embed the query, fetch the nearest chunks, and assemble a [`QueryResult`].
    ///
    /// `top_k == 0` selects the configured default; larger values are capped at the
    /// configured maximum.
    pub async fn search(&self, query: &Query) -> Result<QueryResult, PipelineError> {
        let top_k = if query.top_k == 0 {
            self.settings.default_top_k
        } else {
            query.top_k.min(self.settings.max_top_k)
        };
        tracing::info!(query_id = %query.id, top_k, "Searching");

        let embedding = self
            .embedding_client
            .generate_embeddings(vec![query.text.clone()])
            .await?
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty())
            .ok_or(PipelineError::EmptyEmbedding)?;
        let expected = self.store.dimension();
        if embedding.len() != expected {
            return Err(PipelineError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        let filter = build_query_filter(&query.filter);
        let matches = self
            .store
            .query_vectors(
                &embedding,
                top_k,
                filter.as_ref(),
                query.namespace.as_deref(),
            )
            .await?;

        let mut sources = Vec::with_capacity(matches.len());
        for matched in matches {
            let document = match match_document_id(&matched) {
                Some(id) => self.documents.get(id).await,
                None => None,
            };
            sources.push(map_match(matched, document.as_ref()));
        }

        let answer = match &self.summarizer {
            Some(summarizer) if !sources.is_empty() => {
                let passages: Vec<&str> = sources
                    .iter()
                    .map(|source| source.content.as_str())
                    .collect();
                summarizer
                    .generate_summary(SummarizationRequest {
                        model: self.settings.summarization_model.clone(),
                        prompt: answer_prompt(&query.text, &passages, ANSWER_MAX_WORDS),
                        max_words: ANSWER_MAX_WORDS,
                    })
                    .await?
            }
            _ => String::new(),
        };

        tracing::info!(query_id = %query.id, results = sources.len(), "Search complete");
        Ok(QueryResult {
            query_id: query.id,
            answer,
            sources,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Remove a document's vectors from the index and forget it locally.
    ///
    /// Returns the number of vector ids deleted.
    pub async fn delete_document(&self, id: Uuid) -> Result<usize, PipelineError> {
        let document = self
            .documents
            .get(id)
            .await
            .ok_or(PipelineError::DocumentNotFound(id))?;
        let ids = vector_ids(&document);
        self.store.delete_vectors(&ids).await?;
        self.documents.remove(id).await;
        tracing::info!(document_id = %id, vectors = ids.len(), "Deleted document");
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingClient;
    use crate::pinecone::{Match, UpsertSummary, Vector, VectorStoreError};
    use crate::models::Filter;
    use crate::pipeline::chunking::whitespace_token_counter;
    use crate::pipeline::scan::hash_bytes;
    use crate::summarization::SummarizationClientError;
    use crate::vision::VisionClientError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    const DIMENSION: usize = 4;

    #[derive(Default)]
    struct RecordingStore {
        exists: bool,
        fail_upsert: bool,
        matches: Vec<Match>,
        existence_checks: Mutex<Vec<String>>,
        upserts: Mutex<Vec<Vec<Vector>>>,
        queries: Mutex<Vec<(usize, Option<Value>, Option<String>)>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        fn dimension(&self) -> usize {
            DIMENSION
        }

        async fn upsert_vectors(
            &self,
            vectors: &[Vector],
        ) -> Result<UpsertSummary, VectorStoreError> {
            if self.fail_upsert {
                return Err(VectorStoreError::RemoteApi {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "internal error".into(),
                });
            }
            self.upserts.lock().unwrap().push(vectors.to_vec());
            Ok(UpsertSummary {
                upserted: vectors.len(),
                batches: usize::from(!vectors.is_empty()),
            })
        }

        async fn query_vectors(
            &self,
            _embedding: &[f32],
            top_k: usize,
            filter: Option<&Value>,
            namespace: Option<&str>,
        ) -> Result<Vec<Match>, VectorStoreError> {
            self.queries.lock().unwrap().push((
                top_k,
                filter.cloned(),
                namespace.map(str::to_string),
            ));
            Ok(self.matches.clone())
        }

        async fn check_document_exists(&self, file_hash: &str) -> bool {
            self.existence_checks
                .lock()
                .unwrap()
                .push(file_hash.to_string());
            self.exists
        }

        async fn delete_vectors(&self, ids: &[String]) -> Result<(), VectorStoreError> {
            self.deleted.lock().unwrap().extend_from_slice(ids);
            Ok(())
        }

        async fn get_stats(&self) -> Result<Value, VectorStoreError> {
            Ok(serde_json::json!({ "totalVectorCount": 0 }))
        }
    }

    struct FixedSummarizer;

    #[async_trait]
    impl SummarizationClient for FixedSummarizer {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            if request.prompt.starts_with("Answer") {
                Ok("generated answer".into())
            } else {
                Ok("short summary".into())
            }
        }
    }

    struct FixedVision;

    #[async_trait]
    impl VisionClient for FixedVision {
        async fn analyze_image(&self, _path: &Path) -> Result<String, VisionClientError> {
            Ok("a diagram".into())
        }
    }

    fn settings(chunk_size: usize) -> PipelineSettings {
        PipelineSettings {
            chunk_size,
            chunk_overlap: 0,
            token_counter: whitespace_token_counter(),
            summarization_model: "llama".into(),
            default_top_k: 5,
            max_top_k: 10,
        }
    }

    fn pipeline(store: Arc<RecordingStore>) -> IngestionPipeline {
        IngestionPipeline::new(
            store,
            Arc::new(HashingEmbeddingClient::new(DIMENSION)),
            settings(3),
        )
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn ingest_indexes_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "one two three four five six seven");
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());

        let (document, outcome) = pipeline.ingest_path(&path).await.expect("ingested");

        assert_eq!(outcome, IngestOutcome::Indexed { chunks: 3, vectors: 3 });
        assert_eq!(document.processing_state, ProcessingState::Indexed);
        assert!(document.indexed_at.is_some());
        assert!(document.chunks.iter().all(|chunk| chunk.embedding.is_some()));
        assert_eq!(
            *store.existence_checks.lock().unwrap(),
            vec![document.file_hash.clone()]
        );

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        let ids: Vec<_> = upserts[0].iter().map(|vector| vector.id.clone()).collect();
        assert_eq!(
            ids,
            (0..3)
                .map(|index| format!("{}#{index}", document.id))
                .collect::<Vec<_>>()
        );
        assert_eq!(pipeline.metrics_snapshot().chunks_indexed, 3);
        assert!(pipeline.documents().get(document.id).await.is_some());
    }

    #[tokio::test]
    async fn existing_content_short_circuits_without_extraction() {
        let store = Arc::new(RecordingStore {
            exists: true,
            ..Default::default()
        });
        let pipeline = pipeline(store.clone());
        let mut document = Document::new("gone.txt", "/missing/gone.txt", ".txt", 10, "dup");

        let outcome = pipeline.ingest(&mut document).await.expect("deduplicated");

        assert_eq!(outcome, IngestOutcome::AlreadyIndexed);
        assert_eq!(document.processing_state, ProcessingState::Indexed);
        assert!(document.content.is_empty());
        assert!(store.upserts.lock().unwrap().is_empty());
        assert_eq!(pipeline.metrics_snapshot().documents_deduplicated, 1);
    }

    #[tokio::test]
    async fn identical_content_is_indexed_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(&dir, "a.md", "same words here");
        let second = write(&dir, "b.md", "same words here");
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());

        let (_, first_outcome) = pipeline.ingest_path(&first).await.unwrap();
        let (second_doc, second_outcome) = pipeline.ingest_path(&second).await.unwrap();

        assert!(matches!(first_outcome, IngestOutcome::Indexed { .. }));
        assert_eq!(second_outcome, IngestOutcome::AlreadyIndexed);
        assert_eq!(second_doc.processing_state, ProcessingState::Indexed);
        assert_eq!(store.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_twin_does_not_hide_indexed_twin() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "retry.md", "retried words");
        let hash = hash_bytes(b"retried words");

        for _ in 0..16 {
            let store = Arc::new(RecordingStore::default());
            let pipeline = pipeline(store.clone());
            let mut failed = Document::new("retry.md", "/old/retry.md", ".md", 13, hash.clone());
            failed.fail("upsert failed").unwrap();
            let mut indexed = Document::new("retry.md", "/new/retry.md", ".md", 13, hash.clone());
            indexed.mark_already_indexed().unwrap();
            pipeline.documents().insert(failed).await;
            pipeline.documents().insert(indexed).await;

            let (_, outcome) = pipeline.ingest_path(&path).await.unwrap();

            assert_eq!(outcome, IngestOutcome::AlreadyIndexed);
            assert!(store.upserts.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn unsupported_type_fails_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "archive.zip", "PK");
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());
        let file = scan_file(&path).await.unwrap();
        let mut document = Document::from_file_metadata(&file);

        let error = pipeline.ingest(&mut document).await.unwrap_err();

        assert!(matches!(error, PipelineError::Extract(_)));
        assert_eq!(document.processing_state, ProcessingState::Failed);
        assert!(document.failure_reason().unwrap().contains(".zip"));
        assert!(store.upserts.lock().unwrap().is_empty());
        assert_eq!(pipeline.metrics_snapshot().documents_failed, 1);

        let again = pipeline.ingest(&mut document).await.unwrap_err();
        assert!(matches!(again, PipelineError::State(_)));
        assert_eq!(pipeline.metrics_snapshot().documents_failed, 1);
    }

    #[tokio::test]
    async fn upsert_failure_marks_document_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "alpha beta");
        let store = Arc::new(RecordingStore {
            fail_upsert: true,
            ..Default::default()
        });
        let pipeline = pipeline(store);

        let error = pipeline.ingest_path(&path).await.unwrap_err();
        assert!(matches!(error, PipelineError::VectorStore(_)));

        let stored = pipeline
            .documents()
            .find_by_hash(&hash_bytes(b"alpha beta"))
            .await
            .expect("failed document kept");
        assert_eq!(stored.processing_state, ProcessingState::Failed);
        assert!(stored.failure_reason().unwrap().contains("internal error"));
        assert!(stored.indexed_at.is_none());
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_before_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "alpha beta");
        let store = Arc::new(RecordingStore::default());
        let pipeline = IngestionPipeline::new(
            store.clone(),
            Arc::new(HashingEmbeddingClient::new(DIMENSION + 1)),
            settings(3),
        );

        let error = pipeline.ingest_path(&path).await.unwrap_err();
        assert!(matches!(
            error,
            PipelineError::DimensionMismatch { expected: 4, actual: 5 }
        ));
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_only_file_indexes_without_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "blank.txt", "  \n\t ");
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());

        let (document, outcome) = pipeline.ingest_path(&path).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Indexed { chunks: 0, vectors: 0 });
        assert_eq!(document.processing_state, ProcessingState::Indexed);
    }

    #[tokio::test]
    async fn collaborators_enrich_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "chart.png", "\u{1}PNG");
        let store = Arc::new(RecordingStore::default());
        let pipeline = IngestionPipeline::new(
            store,
            Arc::new(HashingEmbeddingClient::new(DIMENSION)),
            settings(50),
        )
        .with_vision(Arc::new(FixedVision))
        .with_summarizer(Arc::new(FixedSummarizer));

        let (document, _) = pipeline.ingest_path(&path).await.unwrap();

        assert_eq!(document.vision_analysis.as_deref(), Some("a diagram"));
        assert!(document.content.starts_with("[IMAGE FILE: chart.png]"));
        assert!(document.content.contains("a diagram"));
        assert_eq!(document.summary.as_deref(), Some("short summary"));
        assert_eq!(document.processing_state, ProcessingState::Indexed);
    }

    #[tokio::test]
    async fn placeholder_content_skips_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "report.pdf", "%PDF-1.7");
        let pipeline = pipeline(Arc::new(RecordingStore::default()))
            .with_summarizer(Arc::new(FixedSummarizer));

        let (document, _) = pipeline.ingest_path(&path).await.unwrap();
        assert!(document.summary.is_none());
        assert!(is_placeholder(&document.content));
    }

    #[tokio::test]
    async fn search_clamps_top_k_and_uses_local_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "alpha beta");
        let indexing_store = Arc::new(RecordingStore::default());
        let indexing = pipeline(indexing_store.clone());
        let (document, _) = indexing.ingest_path(&path).await.unwrap();
        let vector = indexing_store.upserts.lock().unwrap()[0][0].clone();

        let store = Arc::new(RecordingStore {
            matches: vec![Match {
                id: vector.id.clone(),
                score: 0.87,
                metadata: vector.metadata.clone(),
            }],
            ..Default::default()
        });
        let pipeline = pipeline(store.clone()).with_summarizer(Arc::new(FixedSummarizer));
        pipeline.documents().insert(document.clone()).await;

        let filter = Filter {
            file_type: Some("txt".into()),
            ..Default::default()
        };
        let query = Query::new("alpha?", 500)
            .with_filter(filter)
            .with_namespace("archive");
        let result = pipeline.search(&query).await.expect("search");

        assert_eq!(result.query_id, query.id);
        assert_eq!(result.answer, "generated answer");
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].document_id, document.id);
        assert_eq!(result.sources[0].chunk_id, document.chunks[0].id);
        assert_eq!(result.sources[0].content, "alpha beta");

        let queries = store.queries.lock().unwrap();
        assert_eq!(queries[0].0, 10);
        assert_eq!(
            queries[0].1,
            Some(serde_json::json!({ "file_type": { "$eq": ".txt" } }))
        );
        assert_eq!(queries[0].2.as_deref(), Some("archive"));
    }

    #[tokio::test]
    async fn search_without_summarizer_returns_empty_answer() {
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());

        let result = pipeline.search(&Query::new("anything", 0)).await.unwrap();
        assert!(result.answer.is_empty());
        assert!(result.sources.is_empty());
        assert_eq!(store.queries.lock().unwrap()[0].0, 5);
    }

    #[tokio::test]
    async fn delete_document_removes_vectors_and_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "one two three four");
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline(store.clone());
        let (document, _) = pipeline.ingest_path(&path).await.unwrap();

        let deleted = pipeline.delete_document(document.id).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(
            *store.deleted.lock().unwrap(),
            vec![format!("{}#0", document.id), format!("{}#1", document.id)]
        );
        assert!(pipeline.documents().get(document.id).await.is_none());
        assert!(matches!(
            pipeline.delete_document(document.id).await,
            Err(PipelineError::DocumentNotFound(_))
        ));
    }
}
