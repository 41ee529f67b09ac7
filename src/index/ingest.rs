//! Ingestion pipeline: extract, chunk, embed, and batch-write.

use crate::config::WRITE_BATCH_SIZE;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::chunker;
use crate::index::extractor;
use crate::index::models::{ChunkRecord, chunk_id};
use crate::index::table::ChunkStore;
use std::path::Path;
use std::sync::Arc;

/// Turns one source document into durable, searchable chunk records.
///
/// Writes happen in batches of [`WRITE_BATCH_SIZE`] records, in chunk
/// order. A failed batch aborts the remainder; batches already written
/// stay indexed (at-least-once, no rollback). Partially ingested
/// documents are left for the operator to re-ingest.
pub struct IngestionPipeline {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            chunk_size,
            chunk_overlap,
            batch_size: WRITE_BATCH_SIZE,
        }
    }

    #[cfg(test)]
    fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Ingest one document, returning the number of chunk records written.
    pub async fn ingest(&self, path: &Path) -> Result<usize> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let text = extractor::extract_text(path).await?;
        let chunks = chunker::chunk(&text, self.chunk_size, self.chunk_overlap)?;
        if chunks.is_empty() {
            tracing::info!(%source, "document yielded no extractable text");
            return Ok(0);
        }

        tracing::info!(%source, chunks = chunks.len(), "ingesting document");

        let mut written = 0;
        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let vectors = self.embedder.embed_batch(batch).await?;

            let records: Vec<ChunkRecord> = batch
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(offset, (content, vector))| {
                    let ordinal = batch_index * self.batch_size + offset;
                    ChunkRecord {
                        id: chunk_id(&source, ordinal),
                        content: content.clone(),
                        source: source.clone(),
                        vector,
                    }
                })
                .collect();

            self.store.upsert(&records).await?;
            written += records.len();
            tracing::debug!(%source, written, "chunk batch written");
        }

        tracing::info!(%source, written, "ingestion complete");
        Ok(written)
    }
}
