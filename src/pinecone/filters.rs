//! Metadata filter builders for Pinecone queries.

use crate::extract::normalize_extension;
use crate::models::Filter;
use serde_json::{Value, json};

/// Metadata key holding the SHA-256 digest of the source file.
pub const FILE_HASH_KEY: &str = "file_hash";
/// Metadata key holding the document creation time in Unix seconds.
pub const CREATED_AT_KEY: &str = "created_at";
/// Metadata key holding the leading-dot file extension.
pub const FILE_TYPE_KEY: &str = "file_type";

/// Equality predicate on a single metadata field.
pub fn eq_filter(field: &str, value: impl Into<Value>) -> Value {
    json!({ field: { "$eq": value.into() } })
}

/// Predicate matching every vector derived from a file with the given digest.
pub fn file_hash_filter(file_hash: &str) -> Value {
    eq_filter(FILE_HASH_KEY, file_hash)
}

/// Translate a query [`Filter`] into a Pinecone filter expression.
///
/// Returns `None` for an empty filter. A single clause is sent as-is; several clauses are
/// combined with `$and` so that a metadata entry never collides with a built-in key.
pub fn build_query_filter(filter: &Filter) -> Option<Value> {
    let mut clauses = Vec::new();

    if let Some(file_type) = filter
        .file_type
        .as_deref()
        .map(normalize_extension)
        .filter(|value| !value.is_empty())
    {
        clauses.push(eq_filter(FILE_TYPE_KEY, file_type));
    }

    let mut range = serde_json::Map::new();
    if let Some(from) = filter.date_from {
        range.insert("$gte".into(), Value::from(from.unix_timestamp()));
    }
    if let Some(to) = filter.date_to {
        range.insert("$lte".into(), Value::from(to.unix_timestamp()));
    }
    if !range.is_empty() {
        clauses.push(json!({ CREATED_AT_KEY: Value::Object(range) }));
    }

    let mut entries: Vec<_> = filter
        .metadata
        .iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        clauses.push(eq_filter(key, value.as_str()));
    }

    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn file_hash_filter_uses_eq_operator() {
        assert_eq!(
            file_hash_filter("abc"),
            json!({ "file_hash": { "$eq": "abc" } })
        );
    }

    #[test]
    fn empty_filter_produces_none() {
        assert!(build_query_filter(&Filter::default()).is_none());
    }

    #[test]
    fn single_clause_is_not_wrapped() {
        let filter = Filter {
            file_type: Some("PDF".into()),
            ..Default::default()
        };
        assert_eq!(
            build_query_filter(&filter),
            Some(json!({ "file_type": { "$eq": ".pdf" } }))
        );
    }

    #[test]
    fn combined_filter_uses_and_with_sorted_metadata() {
        let mut filter = Filter {
            file_type: Some(".md".into()),
            date_from: Some(datetime!(2024-01-01 0:00 UTC)),
            date_to: Some(datetime!(2024-12-31 0:00 UTC)),
            ..Default::default()
        };
        filter.metadata.insert("team".into(), "search".into());
        filter.metadata.insert("author".into(), "kim".into());

        let value = build_query_filter(&filter).expect("filter");
        assert_eq!(
            value,
            json!({
                "$and": [
                    { "file_type": { "$eq": ".md" } },
                    { "created_at": { "$gte": 1_704_067_200_i64, "$lte": 1_735_603_200_i64 } },
                    { "author": { "$eq": "kim" } },
                    { "team": { "$eq": "search" } }
                ]
            })
        );
    }
}
