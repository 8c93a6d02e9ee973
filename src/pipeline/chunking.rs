//! Chunk-size heuristics and offset-preserving chunking.
//!
//! A document's content is split into word segments; consecutive segments are grouped into
//! chunks whose token cost stays within the budget. Every chunk records the byte range it
//! covers, so `chunk.content == document.content[start_index..end_index]` always holds.
//!
//! - Automatic sizing: derive a budget from the embedding model's context window and clamp it
//!   to `[256, 1024]`; callers can override via `TEXT_SPLITTER_CHUNK_SIZE`.
//! - Overlap: adjacent chunks may repeat up to `TEXT_SPLITTER_CHUNK_OVERLAP` trailing words of
//!   their predecessor. Every chunk still starts after the previous chunk's start.
//! - Token counting: `tiktoken-rs` encodings for Ollama models (falling back to
//!   `cl100k_base`), whitespace counting for the hashing embedder.

use crate::config::EmbeddingProvider;
use crate::models::{Chunk, Document};
use anyhow::Error as TokenizerError;
use std::sync::Arc;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, r50k_base};

use super::types::ChunkingError;

/// Counts the tokens in a text segment.
pub type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const MIN_AUTOMATIC_CHUNK_SIZE: usize = 256;
const MAX_AUTOMATIC_CHUNK_SIZE: usize = 1024;

/// Determine the chunk size, preferring an explicit override.
///
/// Without an override the size is a quarter of the embedding context window, clamped into
/// `[256, 1024]`.
pub fn determine_chunk_size(
    override_size: Option<usize>,
    provider: EmbeddingProvider,
    model: &str,
) -> usize {
    if let Some(explicit) = override_size {
        return explicit.max(1);
    }

    let window = embedding_context_window(provider, model);
    (window / 4).clamp(MIN_AUTOMATIC_CHUNK_SIZE, MAX_AUTOMATIC_CHUNK_SIZE)
}

/// Look up the embedding context window for a provider/model combination.
pub fn embedding_context_window(provider: EmbeddingProvider, model: &str) -> usize {
    match provider {
        EmbeddingProvider::Hashing => 2048,
        EmbeddingProvider::Ollama => ollama_embedding_context_window(model),
    }
}

fn ollama_embedding_context_window(model: &str) -> usize {
    let normalized = model.to_lowercase();
    match normalized.as_str() {
        "nomic-embed-text" | "mxbai-embed-large" | "mxbai-embed-large-v1" => 8192,
        value if value.contains("all-minilm") => 512,
        value if value.contains("e5-large") => 4096,
        _ => {
            tracing::trace!(model, "Using default Ollama context window estimate");
            4096
        }
    }
}

/// Build a token counter for the given provider/model.
///
/// Ollama models are measured with a `tiktoken` encoding; when no encoding can be loaded the
/// whitespace counter is used instead and the fallback is logged at `warn`.
pub fn build_token_counter(
    provider: EmbeddingProvider,
    model: &str,
) -> Result<TokenCounter, ChunkingError> {
    match provider {
        EmbeddingProvider::Hashing => Ok(whitespace_token_counter()),
        EmbeddingProvider::Ollama => match build_tiktoken_counter(model) {
            Ok(counter) => Ok(counter),
            Err(error) => {
                tracing::warn!(
                    model,
                    error = %error,
                    "Tokenizer unavailable for Ollama model; falling back to whitespace counter"
                );
                Ok(whitespace_token_counter())
            }
        },
    }
}

fn build_tiktoken_counter(model: &str) -> Result<TokenCounter, ChunkingError> {
    let normalized = model.trim();
    let target = if normalized.is_empty() {
        "cl100k_base"
    } else {
        normalized
    };
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; trying encoding name"
            );
            match model {
                "cl100k_base" => cl100k_base(),
                "o200k_base" => o200k_base(),
                "p50k_base" => p50k_base(),
                "r50k_base" | "gpt2" => r50k_base(),
                _ => {
                    tracing::debug!(model, "Using 'cl100k_base' encoding for token counting");
                    cl100k_base()
                }
            }
        }
    }
}

/// Counter treating each whitespace-separated word as one token.
pub fn whitespace_token_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}

/// Byte ranges of the whitespace-separated words in `text`.
fn word_segments(text: &str) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut start = None;
    for (offset, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                segments.push((begin, offset));
                start = None;
            }
            (false, None) => start = Some(offset),
            _ => {}
        }
    }
    if let Some(begin) = start {
        segments.push((begin, text.len()));
    }
    segments
}

/// Split a document's content into chunks of at most `chunk_size` tokens.
///
/// A single word whose cost exceeds the budget becomes a chunk of its own. `overlap` is the
/// number of trailing words of a chunk repeated at the start of the next one; it is capped so
/// each chunk begins strictly after its predecessor. Whitespace-only content yields no chunks.
pub fn chunk_document(
    document: &Document,
    chunk_size: usize,
    overlap: usize,
    counter: &TokenCounter,
) -> Result<Vec<Chunk>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let content = document.content.as_str();
    let segments = word_segments(content);
    let costs: Vec<usize> = segments
        .iter()
        .map(|&(start, end)| counter.as_ref()(&content[start..end]).max(1))
        .collect();

    let mut chunks = Vec::new();
    let mut first = 0;
    while first < segments.len() {
        let mut last = first;
        let mut budget = costs[first];
        while last + 1 < segments.len() && budget + costs[last + 1] <= chunk_size {
            last += 1;
            budget += costs[last];
        }

        let start_index = segments[first].0;
        let end_index = segments[last].1;
        chunks.push(Chunk::new(
            document.id,
            &content[start_index..end_index],
            start_index,
            end_index,
            chunks.len(),
        ));

        if last + 1 == segments.len() {
            break;
        }
        let span = last - first + 1;
        let repeated = overlap.min(span - 1);
        first = last + 1 - repeated;
    }

    tracing::trace!(
        document_id = %document.id,
        words = segments.len(),
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "Chunked document"
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content: &str) -> Document {
        let mut document = Document::new("a.txt", "/a.txt", ".txt", content.len() as u64, "h");
        document.content = content.to_string();
        document
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|chunk| chunk.content.as_str()).collect()
    }

    fn assert_offsets(document: &Document, chunks: &[Chunk]) {
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, position);
            assert!(chunk.start_index < chunk.end_index);
            assert!(chunk.end_index <= document.content.len());
            assert_eq!(
                &document.content[chunk.start_index..chunk.end_index],
                chunk.content
            );
            assert_eq!(chunk.document_id, document.id);
        }
    }

    #[test]
    fn chunks_respect_word_budget() {
        let doc = document("one two three four five");
        let chunks = chunk_document(&doc, 2, 0, &whitespace_token_counter()).unwrap();
        assert_eq!(texts(&chunks), vec!["one two", "three four", "five"]);
        assert_offsets(&doc, &chunks);
    }

    #[test]
    fn overlap_repeats_trailing_words() {
        let doc = document("one two three four five");
        let chunks = chunk_document(&doc, 3, 1, &whitespace_token_counter()).unwrap();
        assert_eq!(texts(&chunks), vec!["one two three", "three four five"]);
        assert_offsets(&doc, &chunks);
    }

    #[test]
    fn oversized_overlap_still_makes_progress() {
        let doc = document("a b c d e f");
        let chunks = chunk_document(&doc, 2, 10, &whitespace_token_counter()).unwrap();
        assert_eq!(texts(&chunks), vec!["a b", "b c", "c d", "d e", "e f"]);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_index > pair[0].start_index);
        }
    }

    #[test]
    fn offsets_survive_irregular_whitespace_and_unicode() {
        let doc = document("  héllo\n\nwörld \t ünïcode  ");
        let chunks = chunk_document(&doc, 2, 0, &whitespace_token_counter()).unwrap();
        assert_eq!(texts(&chunks), vec!["héllo\n\nwörld", "ünïcode"]);
        assert_offsets(&doc, &chunks);
    }

    #[test]
    fn whitespace_only_content_yields_no_chunks() {
        let doc = document(" \n\t ");
        let chunks = chunk_document(&doc, 8, 0, &whitespace_token_counter()).unwrap();
        assert!(chunks.is_empty());
        assert!(chunk_document(&document(""), 8, 0, &whitespace_token_counter())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let error = chunk_document(&document("hello"), 0, 0, &whitespace_token_counter())
            .unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn tiktoken_budget_is_respected() {
        let doc = document("The quick brown fox jumps over the lazy dog.");
        let counter = build_token_counter(EmbeddingProvider::Ollama, "cl100k_base").unwrap();
        let chunks = chunk_document(&doc, 5, 0, &counter).unwrap();
        assert_offsets(&doc, &chunks);

        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|chunk| chunk.content.split_whitespace())
            .collect();
        let source_words: Vec<&str> = doc.content.split_whitespace().collect();
        assert_eq!(rejoined, source_words);
    }

    #[test]
    fn determine_chunk_size_prefers_override() {
        assert_eq!(
            determine_chunk_size(Some(42), EmbeddingProvider::Ollama, "nomic-embed-text"),
            42
        );
        assert_eq!(
            determine_chunk_size(Some(0), EmbeddingProvider::Hashing, "hash"),
            1
        );
    }

    #[test]
    fn determine_chunk_size_handles_common_ollama_models() {
        assert_eq!(
            determine_chunk_size(None, EmbeddingProvider::Ollama, "nomic-embed-text"),
            1024
        );
        assert_eq!(
            determine_chunk_size(None, EmbeddingProvider::Ollama, "all-minilm-l6-v2"),
            256
        );
        assert_eq!(
            determine_chunk_size(None, EmbeddingProvider::Hashing, "anything"),
            512
        );
    }
}
