//! Embedding generation via fastembed.

use crate::error::{ConfigError, EmbeddingError, Result};
use std::path::Path;
use std::sync::Arc;

/// Maps text to a fixed-dimension dense vector.
///
/// Implementations must be deterministic for identical input and model
/// version; the output length must equal `dimensions()` and is checked
/// before any vector reaches the store.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Fixed output dimensionality of this model.
    fn dimensions(&self) -> usize;
}

/// Resolve a configured model identifier to a fastembed model and its
/// output dimensionality.
pub fn resolve_model(name: &str) -> Result<(fastembed::EmbeddingModel, usize), ConfigError> {
    match name {
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            Ok((fastembed::EmbeddingModel::AllMiniLML6V2, 384))
        }
        "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => {
            Ok((fastembed::EmbeddingModel::BGESmallENV15, 384))
        }
        other => Err(ConfigError::UnknownEmbeddingModel(other.to_string())),
    }
}

/// fastembed-backed embedder.
///
/// fastembed's TextEmbedding is synchronous, so calls go through
/// `spawn_blocking` with the model shared behind an Arc.
pub struct FastembedEmbedder {
    model: Arc<fastembed::TextEmbedding>,
    dimensions: usize,
}

impl FastembedEmbedder {
    /// Load the model, storing downloaded model files in `cache_dir`.
    ///
    /// Limits ONNX intra-op threads to avoid large thread-pool
    /// allocations on many-core machines.
    pub fn new(model_name: &str, cache_dir: &Path) -> Result<Self> {
        if std::env::var("OMP_NUM_THREADS").is_err() {
            // SAFETY: called once during single-threaded init before any
            // ONNX threads are spawned.
            unsafe { std::env::set_var("OMP_NUM_THREADS", "2") };
        }

        let (model, dimensions) = resolve_model(model_name)?;
        let options = fastembed::InitOptions::new(model)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(true);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Failed(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            dimensions,
        })
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    got: vector.len(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Embedder for FastembedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Failed("model returned no vectors".to_string()).into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let owned = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || {
            model
                .embed(owned, None)
                .map_err(|e| EmbeddingError::Failed(e.to_string()))
        })
        .await
        .map_err(|e| anyhow::anyhow!("embedding task failed: {e}"))??;

        self.check_dimensions(&vectors)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
