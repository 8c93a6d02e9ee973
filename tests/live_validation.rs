use std::{env, sync::Once};

use ragdex::{
    config, embedding,
    pinecone::{PineconeClient, PineconeSettings},
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("EMBEDDING_PROVIDER", "ollama");
        set_default_env("EMBEDDING_MODEL", "nomic-embed-text");
        set_default_env("EMBEDDING_DIMENSION", "768");
        set_default_env("OLLAMA_URL", "http://127.0.0.1:11434");
        config::init_config().expect("configuration loads");
    });
}

#[tokio::test]
#[ignore = "Requires a live Pinecone index (PINECONE_API_KEY, PINECONE_INDEX_NAME, PINECONE_HOST)"]
async fn live_pinecone_stats() {
    init_config_once();
    let settings = PineconeSettings::from_config(config::get_config());
    let client = PineconeClient::new(&settings, reqwest::Client::new()).expect("pinecone client");
    let stats = client.get_stats().await.expect("describe_index_stats");
    assert!(stats.is_object(), "stats should be a JSON object: {stats}");
    assert!(!client.check_document_exists("0000-not-a-real-hash").await);
}

#[tokio::test]
#[ignore = "Requires live Ollama embeddings"]
async fn live_ollama_embedding_roundtrip() {
    init_config_once();
    let config = config::get_config();
    let client = embedding::get_embedding_client(config, reqwest::Client::new());
    let vectors = client
        .generate_embeddings(vec!["ragdex live embedding".to_string()])
        .await
        .expect("failed to request embeddings from provider");
    assert_eq!(vectors.len(), 1, "expected embedding per input chunk");
    assert_eq!(
        vectors[0].len(),
        config.embedding_dimension,
        "embedding dimension mismatch"
    );
}
