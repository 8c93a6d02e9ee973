use crate::config::{Config, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied chunk of text, in input order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic embedding client that hashes bytes into a fixed-size unit vector.
///
/// Useful offline and in tests; similar texts do not necessarily land close together.
pub struct HashingEmbeddingClient {
    dimension: usize,
}

impl HashingEmbeddingClient {
    /// Construct a client producing vectors of `dimension` values.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        if text.is_empty() {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for HashingEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        Ok(texts
            .into_iter()
            .map(|text| Self::encode(&text, self.dimension))
            .collect())
    }
}

/// Embedding client backed by an Ollama runtime (`POST /api/embed`).
pub struct OllamaEmbeddingClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingClient {
    /// Construct a client for `model` served at `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }
        tracing::debug!(model = %self.model, inputs = texts.len(), "Requesting embeddings");

        let response = self
            .http
            .post(self.endpoint())
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::GenerationFailed(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaEmbedResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::GenerationFailed(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;
        Ok(body.embeddings)
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client(config: &Config, http: Client) -> Box<dyn EmbeddingClient + Send + Sync> {
    tracing::debug!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        dimension = config.embedding_dimension,
        "Initializing embedding client"
    );
    match config.embedding_provider {
        EmbeddingProvider::Hashing => Box::new(HashingEmbeddingClient::new(config.embedding_dimension)),
        EmbeddingProvider::Ollama => Box::new(OllamaEmbeddingClient::new(
            http,
            config.ollama_url.clone(),
            config.embedding_model.clone(),
        )),
    }
}
