//! Document indexing: chunking, extraction, storage, and the ingestion
//! pipeline that ties them together.

pub mod chunker;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod table;

pub use ingest::IngestionPipeline;
pub use models::{Answer, ChunkRecord, RetrievedChunk};
pub use table::{ChunkStore, LanceChunkStore};
