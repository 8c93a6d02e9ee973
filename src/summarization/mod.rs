//! Abstractions for generating document summaries and query answers.
//!
//! Summarization is optional; when no provider is configured the pipeline skips the
//! `Summarized` stage and queries return their sources without a generated answer. The
//! Ollama-backed client issues requests against the runtime's `/api/generate` endpoint.

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while attempting summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was explicitly disabled or unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Fully qualified model identifier understood by the provider.
    pub model: String,
    /// Prompt assembled by the pipeline.
    pub prompt: String,
    /// Maximum word budget requested by the caller.
    pub max_words: usize,
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate text for the prompt using the configured model.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Build a summarization client based on configuration.
pub fn get_summarization_client(
    config: &Config,
    http: Client,
) -> Option<Box<dyn SummarizationClient + Send + Sync>> {
    match config.summarization_provider {
        SummarizationProvider::None => None,
        SummarizationProvider::Ollama => Some(Box::new(OllamaSummarizationClient::new(
            http,
            config.ollama_url.clone(),
        ))),
    }
}

/// Summarization client talking to an Ollama runtime.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
}

impl OllamaSummarizationClient {
    /// Construct a client for the runtime at `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaResponse {
    pub(crate) response: String,
    pub(crate) done: bool,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": 0.1,
                "num_predict": request.max_words.saturating_mul(2),
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

/// Prompt asking for a summary of a document's extracted text.
pub fn document_summary_prompt(file_name: &str, content: &str, max_words: usize) -> String {
    format!(
        "Summarize the file \"{file_name}\" in at most {max_words} words. \
         Focus on its purpose and key facts.\n\n---\n{content}\n---"
    )
}

/// Prompt asking for an answer grounded in retrieved passages.
pub fn answer_prompt(question: &str, passages: &[&str], max_words: usize) -> String {
    let mut prompt = format!(
        "Answer the question using only the passages below, in at most {max_words} words. \
         Say so when the passages do not contain the answer.\n\nQuestion: {question}\n"
    );
    for (index, passage) in passages.iter().enumerate() {
        prompt.push_str(&format!("\n[{}] {}\n", index + 1, passage.trim()));
    }
    prompt
}
