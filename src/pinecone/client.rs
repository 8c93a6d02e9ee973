//! HTTP client wrapper for a single Pinecone index.

use crate::pinecone::{
    filters::file_hash_filter,
    types::{
        DeleteRequest, Match, PineconeSettings, QueryRequest, QueryResponse, UpsertRequest,
        UpsertResponse, UpsertSummary, Vector, VectorStoreError,
    },
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Maximum number of vectors sent in one upsert request.
pub const UPSERT_BATCH_SIZE: usize = 100;
/// Namespace used for every request when namespaces are enabled.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Lightweight HTTP client for Pinecone data-plane operations.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct PineconeClient {
    pub(crate) client: Client,
    pub(crate) host: String,
    pub(crate) api_key: String,
    pub(crate) dimension: usize,
    pub(crate) namespace: Option<String>,
}

impl PineconeClient {
    /// Build a client for the configured index on top of a shared HTTP client.
    pub fn new(settings: &PineconeSettings, client: Client) -> Result<Self, VectorStoreError> {
        let api_key = required(settings.api_key.as_deref(), "API key is required")?;
        let index_name = required(settings.index_name.as_deref(), "index name is required")?;
        if settings.dimension == 0 {
            return Err(VectorStoreError::Configuration(
                "vector dimension must be greater than zero".into(),
            ));
        }
        let host = resolve_host(settings, index_name)?;

        tracing::info!(
            index = index_name,
            host = %host,
            dimension = settings.dimension,
            use_namespaces = settings.use_namespaces,
            "Connecting to Pinecone"
        );

        Ok(Self {
            client,
            host,
            api_key: api_key.to_string(),
            dimension: settings.dimension,
            namespace: settings
                .use_namespaces
                .then(|| DEFAULT_NAMESPACE.to_string()),
        })
    }

    /// Base URL of the index.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Namespace attached to requests, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Dimension of the index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Write vectors in order, in batches of [`UPSERT_BATCH_SIZE`].
    ///
    /// Batches are sent one after another. When a batch fails the error reports how many
    /// vectors were already written; those stay in the index.
    pub async fn upsert_vectors(
        &self,
        vectors: &[Vector],
    ) -> Result<UpsertSummary, VectorStoreError> {
        if vectors.is_empty() {
            return Ok(UpsertSummary::default());
        }

        let total_batches = vectors.len().div_ceil(UPSERT_BATCH_SIZE);
        tracing::debug!(count = vectors.len(), total_batches, "Upserting vectors");

        let mut committed = 0;
        for (position, batch) in vectors.chunks(UPSERT_BATCH_SIZE).enumerate() {
            let batch_number = position + 1;
            if let Err(error) = self.upsert_batch(batch).await {
                tracing::error!(
                    batch = batch_number,
                    total_batches,
                    committed,
                    error = %error,
                    "Upsert batch failed"
                );
                return Err(VectorStoreError::BatchUpsertFailed {
                    batch: batch_number,
                    total_batches,
                    committed,
                    source: Box::new(error),
                });
            }
            committed += batch.len();
            tracing::debug!(
                batch = batch_number,
                from = committed - batch.len(),
                to = committed,
                "Upserted batch"
            );
        }

        tracing::info!(total = committed, batches = total_batches, "Upserted vectors");
        Ok(UpsertSummary {
            upserted: committed,
            batches: total_batches,
        })
    }

    async fn upsert_batch(&self, batch: &[Vector]) -> Result<(), VectorStoreError> {
        let body = UpsertRequest {
            vectors: batch,
            namespace: self.namespace(),
        };
        let text = self.post_json("vectors/upsert", &body).await?;
        match serde_json::from_str::<UpsertResponse>(&text) {
            Ok(UpsertResponse {
                upserted_count: Some(count),
            }) if count != batch.len() => {
                tracing::warn!(sent = batch.len(), acknowledged = count, "Upsert count mismatch");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(error = %error, "Ignoring unparseable upsert acknowledgement");
            }
        }
        Ok(())
    }

    /// Fetch the `top_k` nearest neighbours in the configured namespace.
    pub async fn query_vectors(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<Match>, VectorStoreError> {
        self.query_vectors_in(None, embedding, top_k, filter).await
    }

    /// Fetch the `top_k` nearest neighbours, optionally overriding the namespace.
    ///
    /// Matches come back in the store's ranking order (descending score).
    pub async fn query_vectors_in(
        &self,
        namespace: Option<&str>,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<Match>, VectorStoreError> {
        tracing::debug!(top_k, has_filter = filter.is_some(), "Querying vectors");

        let body = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            filter,
            namespace: namespace.or(self.namespace()),
        };
        let text = self.post_json("query", &body).await?;
        let response: QueryResponse = serde_json::from_str(&text)
            .map_err(|error| VectorStoreError::Decode(error.to_string()))?;

        tracing::debug!(matches = response.matches.len(), "Query complete");
        Ok(response.matches)
    }

    /// Whether any vector derived from a file with `file_hash` is indexed.
    ///
    /// Fails open: a failed lookup reports `false` so ingestion is never blocked by it.
    pub async fn check_document_exists(&self, file_hash: &str) -> bool {
        tracing::debug!(hash = file_hash, "Checking document existence");
        let probe = vec![0.0_f32; self.dimension];
        let filter = file_hash_filter(file_hash);

        match self.query_vectors(&probe, 1, Some(&filter)).await {
            Ok(matches) => {
                let exists = !matches.is_empty();
                tracing::debug!(hash = file_hash, exists, "Document existence check complete");
                exists
            }
            Err(error) => {
                tracing::warn!(hash = file_hash, error = %error, "Failed to check document existence");
                false
            }
        }
    }

    /// Index statistics as reported by the store.
    pub async fn get_stats(&self) -> Result<Value, VectorStoreError> {
        let text = self
            .post_json("describe_index_stats", &serde_json::json!({}))
            .await?;
        serde_json::from_str(&text).map_err(|error| VectorStoreError::Decode(error.to_string()))
    }

    /// Remove vectors by identifier.
    pub async fn delete_vectors(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let body = DeleteRequest {
            ids,
            namespace: self.namespace(),
        };
        self.post_json("vectors/delete", &body).await?;
        tracing::debug!(count = ids.len(), "Deleted vectors");
        Ok(())
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format_endpoint(&self.host, path))
            .header("Api-Key", &self.api_key)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, VectorStoreError> {
        let response = self.request(path).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            Ok(text)
        } else {
            let error = VectorStoreError::RemoteApi { status, body: text };
            tracing::error!(path, error = %error, "Pinecone request failed");
            Err(error)
        }
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, VectorStoreError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| VectorStoreError::Configuration(message.to_string()))
}

/// Resolve the index host from an explicit override or the index coordinates.
fn resolve_host(settings: &PineconeSettings, index_name: &str) -> Result<String, VectorStoreError> {
    if let Some(host) = settings
        .host
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        let host = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let parsed = reqwest::Url::parse(&host)
            .map_err(|error| VectorStoreError::Configuration(format!("invalid host: {error}")))?;
        return Ok(parsed.as_str().trim_end_matches('/').to_string());
    }

    let project = required(
        settings.project_id.as_deref(),
        "project id is required when no host is configured",
    )?;
    Ok(format!(
        "https://{index_name}-{project}.svc.{}.{}.pinecone.io",
        settings.region, settings.cloud
    ))
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
