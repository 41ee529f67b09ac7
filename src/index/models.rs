//! Record types shared by the ingestion pipeline and the query engine.

use serde::Serialize;

/// One indexed unit of content: a chunk of a source document plus its
/// embedding vector. The vector length must match the table schema's
/// declared dimensionality.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Deterministic id, see [`chunk_id`].
    pub id: String,
    /// The literal chunk substring of the extracted document text.
    pub content: String,
    /// Originating document file name, used for attribution.
    pub source: String,
    /// Embedding of `content`.
    pub vector: Vec<f32>,
}

/// A nearest-neighbor hit, carrying only what context assembly needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
}

/// A generated answer with per-chunk source attribution.
///
/// `sources` preserves retrieval order and duplicates; display layers
/// that want unique attribution deduplicate themselves.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Deterministic chunk id from the source file name and chunk ordinal.
///
/// Re-ingesting the same document with the same chunking parameters
/// produces the same ids, so writes behave as replacements. Dots and
/// spaces are stripped from the file name to keep ids predicate-safe.
pub fn chunk_id(source: &str, ordinal: usize) -> String {
    let sanitized: String = source
        .chars()
        .filter_map(|c| match c {
            '.' => Some('_'),
            ' ' => None,
            other => Some(other),
        })
        .collect();
    format!("{sanitized}-{ordinal}")
}
