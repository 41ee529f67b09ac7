//! Error taxonomy for the ingestion and query pipelines.
//!
//! Each subsystem surfaces its own error kind so callers can decide on
//! retry policy per kind. Nothing in the core retries internally.

use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level crate error. Subsystem errors fold into this via `From`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Missing or invalid startup configuration. Fatal, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidChunking { size: usize, overlap: usize },

    #[error("unknown embedding model '{0}'")]
    UnknownEmbeddingModel(String),
}

/// Ingestion input problems: the document path or its contents.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("failed to read document {path}: {message}")]
    DocumentUnreadable { path: PathBuf, message: String },
}

/// Embedding computation failures.
///
/// A dimension mismatch is a configuration bug (model vs. index schema),
/// not a transient fault.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding failed: {0}")]
    Failed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Index store failures: schema creation, writes, or queries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lancedb error: {0}")]
    LanceDb(String),
}

/// Generation provider failures, kept distinct so callers can apply
/// backoff to rate limits without conflating them with store errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("generation response contained no choices")]
    EmptyResponse,
}
