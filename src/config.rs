use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_PINECONE_CLOUD: &str = "aws";
const DEFAULT_PINECONE_REGION: &str = "us-east-1";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "llama3.1";
const DEFAULT_SEARCH_TOP_K: usize = 5;
const DEFAULT_SEARCH_MAX_TOP_K: usize = 100;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the ragdex pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key attached to every Pinecone request.
    pub pinecone_api_key: Option<String>,
    /// Name of the Pinecone index receiving document vectors.
    pub pinecone_index_name: Option<String>,
    /// Project identifier embedded in the derived index host.
    pub pinecone_project_id: Option<String>,
    /// Cloud provider segment of the derived index host.
    pub pinecone_cloud: String,
    /// Region segment of the derived index host.
    pub pinecone_region: String,
    /// Explicit index host, bypassing host derivation when set.
    pub pinecone_host: Option<String>,
    /// Whether every request is scoped to the fixed `default` namespace.
    pub pinecone_use_namespaces: bool,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors (and of the index).
    pub embedding_dimension: usize,
    /// Base URL of the Ollama runtime backing the model collaborators.
    pub ollama_url: String,
    /// Provider used for document summaries and query answers.
    pub summarization_provider: SummarizationProvider,
    /// Model used by the summarization provider.
    pub summarization_model: String,
    /// Multimodal model used for image analysis; vision is disabled when unset.
    pub vision_model: Option<String>,
    /// Optional override for the automatic chunk size selection.
    pub text_splitter_chunk_size: Option<usize>,
    /// Number of words repeated between adjacent chunks.
    pub text_splitter_chunk_overlap: usize,
    /// Result count used when a query does not specify one.
    pub search_default_top_k: usize,
    /// Upper bound applied to requested result counts.
    pub search_max_top_k: usize,
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic local hashing embedder (no network).
    Hashing,
    /// Local Ollama runtime.
    Ollama,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Summaries are skipped.
    None,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pinecone_api_key: load_env_optional("PINECONE_API_KEY"),
            pinecone_index_name: load_env_optional("PINECONE_INDEX_NAME"),
            pinecone_project_id: load_env_optional("PINECONE_PROJECT_ID"),
            pinecone_cloud: load_env_optional("PINECONE_CLOUD")
                .unwrap_or_else(|| DEFAULT_PINECONE_CLOUD.to_string()),
            pinecone_region: load_env_optional("PINECONE_REGION")
                .unwrap_or_else(|| DEFAULT_PINECONE_REGION.to_string()),
            pinecone_host: load_env_optional("PINECONE_HOST"),
            pinecone_use_namespaces: load_env_optional("PINECONE_USE_NAMESPACES")
                .map(|value| parse_bool("PINECONE_USE_NAMESPACES", &value))
                .transpose()?
                .unwrap_or(false),
            embedding_provider: load_env("EMBEDDING_PROVIDER")?
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            summarization_provider: load_env_optional("SUMMARIZATION_PROVIDER")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(SummarizationProvider::None),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            vision_model: load_env_optional("VISION_MODEL"),
            text_splitter_chunk_size: parse_optional("TEXT_SPLITTER_CHUNK_SIZE")?,
            text_splitter_chunk_overlap: parse_optional("TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(0),
            search_default_top_k: parse_optional("SEARCH_DEFAULT_TOP_K")?
                .unwrap_or(DEFAULT_SEARCH_TOP_K),
            search_max_top_k: parse_optional("SEARCH_MAX_TOP_K")?
                .unwrap_or(DEFAULT_SEARCH_MAX_TOP_K),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        index = ?config.pinecone_index_name,
        host = ?config.pinecone_host,
        use_namespaces = config.pinecone_use_namespaces,
        embedding_provider = ?config.embedding_provider,
        dimension = config.embedding_dimension,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
