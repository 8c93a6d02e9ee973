//! Mapping between documents, vector metadata, and search results.

use crate::models::{Chunk, Document, SearchResult, vector_id};
use crate::pinecone::filters::{CREATED_AT_KEY, FILE_HASH_KEY, FILE_TYPE_KEY};
use crate::pinecone::{Match, Vector};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::types::PipelineError;

pub(crate) const DOCUMENT_ID_KEY: &str = "document_id";
pub(crate) const CHUNK_ID_KEY: &str = "chunk_id";
pub(crate) const CHUNK_INDEX_KEY: &str = "chunk_index";
pub(crate) const FILE_NAME_KEY: &str = "file_name";
pub(crate) const FILE_PATH_KEY: &str = "file_path";
pub(crate) const TEXT_KEY: &str = "text";

const RESERVED_KEYS: [&str; 9] = [
    FILE_HASH_KEY,
    DOCUMENT_ID_KEY,
    CHUNK_ID_KEY,
    CHUNK_INDEX_KEY,
    FILE_NAME_KEY,
    FILE_PATH_KEY,
    FILE_TYPE_KEY,
    CREATED_AT_KEY,
    TEXT_KEY,
];

/// Flat metadata stored alongside a chunk's vector.
///
/// Document metadata entries are copied first; the built-in keys always win.
pub(crate) fn build_vector_metadata(document: &Document, chunk: &Chunk) -> Map<String, Value> {
    let mut metadata: Map<String, Value> = document
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    metadata.insert(FILE_HASH_KEY.into(), document.file_hash.clone().into());
    metadata.insert(DOCUMENT_ID_KEY.into(), document.id.to_string().into());
    metadata.insert(CHUNK_ID_KEY.into(), chunk.id.to_string().into());
    metadata.insert(CHUNK_INDEX_KEY.into(), chunk.chunk_index.into());
    metadata.insert(FILE_NAME_KEY.into(), document.file_name.clone().into());
    metadata.insert(FILE_PATH_KEY.into(), document.file_path.clone().into());
    metadata.insert(FILE_TYPE_KEY.into(), document.file_type.clone().into());
    metadata.insert(
        CREATED_AT_KEY.into(),
        document.created_at.unix_timestamp().into(),
    );
    metadata.insert(TEXT_KEY.into(), chunk.content.clone().into());
    metadata
}

/// One vector per embedded chunk, in chunk order.
pub(crate) fn build_vectors(document: &Document) -> Result<Vec<Vector>, PipelineError> {
    document
        .chunks
        .iter()
        .map(|chunk| {
            let values = chunk
                .embedding
                .clone()
                .ok_or(PipelineError::MissingEmbedding {
                    chunk_index: chunk.chunk_index,
                })?;
            Ok(Vector {
                id: vector_id(document.id, chunk.chunk_index),
                values,
                metadata: build_vector_metadata(document, chunk),
            })
        })
        .collect()
}

/// Vector ids for every chunk of `document`.
pub(crate) fn vector_ids(document: &Document) -> Vec<String> {
    document
        .chunks
        .iter()
        .map(|chunk| vector_id(document.id, chunk.chunk_index))
        .collect()
}

/// Document a match belongs to, from its metadata or its vector id.
pub(crate) fn match_document_id(matched: &Match) -> Option<Uuid> {
    matched
        .metadata
        .get(DOCUMENT_ID_KEY)
        .and_then(Value::as_str)
        .or_else(|| matched.id.split('#').next())
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Join a match back to its document.
///
/// Fields come from the locally known document and chunk when available and from the
/// match metadata otherwise.
pub(crate) fn map_match(matched: Match, document: Option<&Document>) -> SearchResult {
    let document_id = match_document_id(&matched).unwrap_or_else(Uuid::nil);
    let Match {
        score,
        mut metadata,
        ..
    } = matched;
    let chunk_id = take_uuid(&mut metadata, CHUNK_ID_KEY).unwrap_or_else(Uuid::nil);
    let chunk_index = metadata.get(CHUNK_INDEX_KEY).and_then(Value::as_u64);

    let chunk = document.and_then(|doc| {
        doc.chunk(chunk_id).or_else(|| {
            chunk_index.and_then(|index| doc.chunks.iter().find(|c| c.chunk_index as u64 == index))
        })
    });

    let content = chunk
        .map(|chunk| chunk.content.clone())
        .or_else(|| take_string(&mut metadata, TEXT_KEY))
        .unwrap_or_default();
    let file_name = document
        .map(|doc| doc.file_name.clone())
        .or_else(|| take_string(&mut metadata, FILE_NAME_KEY))
        .unwrap_or_default();
    let file_path = document
        .map(|doc| doc.file_path.clone())
        .or_else(|| take_string(&mut metadata, FILE_PATH_KEY))
        .unwrap_or_default();
    let file_type = document
        .map(|doc| doc.file_type.clone())
        .or_else(|| take_string(&mut metadata, FILE_TYPE_KEY))
        .unwrap_or_default();

    let remaining: HashMap<String, String> = metadata
        .into_iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            Value::Number(number) => Some((key, number.to_string())),
            Value::Bool(flag) => Some((key, flag.to_string())),
            _ => None,
        })
        .collect();

    SearchResult {
        document_id,
        chunk_id: chunk.map(|chunk| chunk.id).unwrap_or(chunk_id),
        score,
        content,
        file_name,
        file_path,
        file_type,
        metadata: remaining,
    }
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
    match metadata.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

fn take_uuid(metadata: &mut Map<String, Value>, key: &str) -> Option<Uuid> {
    take_string(metadata, key).and_then(|value| Uuid::parse_str(&value).ok())
}
