//! Citation sources attached to an answer.
//!
//! The backend hands back each source either as a JSON object or as a
//! JSON-encoded string of that object. Both shapes are resolved once into
//! [`Source`] at deserialization time, so rendering never looks at raw JSON.

use serde::Deserialize;
use serde_json::{Map, Value};

pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";
pub const UNKNOWN_CHUNK: &str = "N/A";
pub const UNKNOWN_SOURCE: &str = "Unknown source";

const DOCUMENT_NAME_LIMIT: usize = 60;
const SNIPPET_LIMIT: usize = 200;
const OPAQUE_LIMIT: usize = 80;

/// Structured citation metadata. Missing fields fall back to display defaults
/// in [`render_source`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceRef {
    pub document_name: Option<String>,
    /// Chunk ids arrive as strings or numbers; both are kept as display text.
    pub chunk_id: Option<String>,
    pub snippet: Option<String>,
}

impl SourceRef {
    fn from_map(map: &Map<String, Value>) -> Self {
        let document_name = match map.get("document_name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
            Some(number @ Value::Number(_)) => Some(number.to_string()),
            _ => None,
        };

        let chunk_id = match map.get("chunk_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) => Some(other.to_string()),
        };

        let snippet = match map.get("snippet") {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        };

        Self {
            document_name,
            chunk_id,
            snippet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum Source {
    Structured(SourceRef),
    /// Anything that did not resolve to an object, kept as display text.
    Opaque(String),
}

impl Source {
    /// Resolve a source that arrived as a string. JSON objects and arrays
    /// become [`Source::Structured`] (arrays carry no fields, so they show the
    /// defaults); other JSON values and unparsable text stay opaque.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Source::Structured(SourceRef::from_map(&map)),
            Ok(Value::Array(_)) => Source::Structured(SourceRef::default()),
            Ok(Value::String(inner)) => Source::Opaque(inner),
            Ok(_) => Source::Opaque(raw.to_string()),
            Err(err) => {
                tracing::warn!(%err, source = raw, "could not parse source string");
                Source::Opaque(raw.to_string())
            }
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Source::Structured(SourceRef::from_map(&map)),
            Value::Array(_) => Source::Structured(SourceRef::default()),
            Value::String(raw) => Source::parse(&raw),
            Value::Null => Source::Opaque(String::new()),
            other => Source::Opaque(other.to_string()),
        }
    }
}

/// What a single entry of the "Sources:" list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDisplay {
    /// File/chunk line, or the opaque text. Never empty.
    pub meta: String,
    /// Snippet shown beneath the meta line.
    pub preview: Option<String>,
}

pub fn render_source(source: &Source) -> SourceDisplay {
    match source {
        Source::Structured(reference) => {
            let name = reference
                .document_name
                .as_deref()
                .unwrap_or(UNKNOWN_DOCUMENT);
            let chunk = reference.chunk_id.as_deref().unwrap_or(UNKNOWN_CHUNK);

            SourceDisplay {
                meta: format!(
                    "File: {} (Chunk ID: {})",
                    truncate(name, DOCUMENT_NAME_LIMIT),
                    chunk
                ),
                preview: reference
                    .snippet
                    .as_deref()
                    .map(|snippet| truncate(snippet, SNIPPET_LIMIT)),
            }
        }
        Source::Opaque(text) if text.trim().is_empty() => SourceDisplay {
            meta: UNKNOWN_SOURCE.to_string(),
            preview: None,
        },
        Source::Opaque(text) => SourceDisplay {
            meta: truncate(text, OPAQUE_LIMIT),
            preview: None,
        },
    }
}

/// Cut `text` to at most `limit` characters, ending in "..." when shortened.
pub fn truncate(text: &str, limit: usize) -> String {
    // Character count, not byte length, so multi-byte text is never split
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}
