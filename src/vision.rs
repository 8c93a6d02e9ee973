//! Image analysis collaborator backed by a multimodal Ollama model.

use crate::summarization::OllamaResponse;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use thiserror::Error;

const ANALYSIS_PROMPT: &str = "Describe this image for a search index. List any visible text \
verbatim, then describe diagrams, charts, or photos in a few sentences.";

/// Errors surfaced while analyzing an image.
#[derive(Debug, Error)]
pub enum VisionClientError {
    /// The image could not be read from disk.
    #[error("Failed to read image {path}: {source}")]
    Io {
        /// Image path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Provider was unreachable or answered with an error.
    #[error("Image analysis failed: {0}")]
    AnalysisFailed(String),
}

/// Interface implemented by image analysis providers.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Produce a textual description of the image at `path`.
    async fn analyze_image(&self, path: &Path) -> Result<String, VisionClientError>;
}

/// Vision client that sends base64 images to Ollama's `/api/generate`.
pub struct OllamaVisionClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaVisionClient {
    /// Construct a client for `model` served at `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VisionClient for OllamaVisionClient {
    async fn analyze_image(&self, path: &Path) -> Result<String, VisionClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| VisionClientError::Io {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!(file = %path.display(), bytes = bytes.len(), model = %self.model, "Analyzing image");

        let payload = json!({
            "model": self.model,
            "prompt": ANALYSIS_PROMPT,
            "images": [STANDARD.encode(&bytes)],
            "stream": false,
        });
        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| VisionClientError::AnalysisFailed(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionClientError::AnalysisFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|error| VisionClientError::AnalysisFailed(error.to_string()))?;
        if !body.done {
            return Err(VisionClientError::AnalysisFailed(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }
        Ok(body.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn sends_base64_image_and_returns_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"abc").unwrap();

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains("\"model\":\"llava\"")
                    .body_contains("\"images\":[\"YWJj\"]");
                then.status(200).json_body(json!({
                    "response": "A bar chart of quarterly revenue.",
                    "done": true
                }));
            })
            .await;

        let client = OllamaVisionClient::new(Client::new(), server.base_url(), "llava");
        let analysis = client.analyze_image(&path).await.expect("analysis");

        mock.assert();
        assert_eq!(analysis, "A bar chart of quarterly revenue.");
    }

    #[tokio::test]
    async fn missing_image_is_io_error() {
        let client = OllamaVisionClient::new(Client::new(), "http://127.0.0.1:1", "llava");
        let error = client
            .analyze_image(Path::new("/no/such/image.png"))
            .await
            .unwrap_err();
        assert!(matches!(error, VisionClientError::Io { .. }));
    }
}
