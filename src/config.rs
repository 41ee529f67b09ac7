//! Environment-sourced configuration with fail-fast validation.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Number of chunk records per store write.
pub const WRITE_BATCH_SIZE: usize = 50;

/// Sampling temperature for answer generation.
pub const GENERATION_TEMPERATURE: f32 = 0.5;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the LanceDB tables and the embedding model cache.
    pub data_dir: PathBuf,
    /// API key for the generation provider.
    pub groq_api_key: String,
    /// OpenAI-compatible API root of the generation provider.
    pub groq_base_url: String,
    /// Name of the chunk table.
    pub table_name: String,
    /// Embedding model identifier (must map to a fastembed model).
    pub embedding_model: String,
    /// Generation model identifier.
    pub chat_model: String,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of nearest neighbors retrieved per query.
    pub top_k: usize,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Fails fast on a missing credential, an unparseable numeric value,
    /// or chunking parameters that would not terminate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let groq_api_key = required("GROQ_API_KEY")?;
        let groq_base_url =
            optional("GROQ_BASE_URL").unwrap_or_else(|| "https://api.groq.com/openai".to_string());
        let data_dir = PathBuf::from(
            optional("GROUNDER_DATA_DIR").unwrap_or_else(|| "./grounder-data".to_string()),
        );
        let table_name = optional("GROUNDER_INDEX").unwrap_or_else(|| "chunks".to_string());
        let embedding_model = optional("GROUNDER_EMBEDDING_MODEL")
            .unwrap_or_else(|| "all-MiniLM-L6-v2".to_string());
        let chat_model = optional("GROUNDER_CHAT_MODEL")
            .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string());

        let chunk_size = numeric("GROUNDER_CHUNK_SIZE", 500)?;
        let chunk_overlap = numeric("GROUNDER_CHUNK_OVERLAP", 50)?;
        let top_k = numeric("GROUNDER_TOP_K", 5)?;

        let config = Self {
            data_dir,
            groq_api_key,
            groq_base_url,
            table_name,
            embedding_model,
            chat_model,
            chunk_size,
            chunk_overlap,
            top_k,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidChunking {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidVar {
                var: "GROUNDER_TOP_K",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Cache directory for downloaded embedding model files.
    pub fn model_cache_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }
}

fn optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn numeric(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    match optional(var) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            var,
            message: format!("expected a non-negative integer, got '{raw}'"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn base_config() -> Config {
        Config {
            data_dir: PathBuf::from("/tmp/grounder"),
            groq_api_key: "test-key".to_string(),
            groq_base_url: "https://api.groq.com/openai".to_string(),
            table_name: "chunks".to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            chat_model: "llama-3.3-70b-versatile".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 5,
        }
    }

    #[test]
    fn default_chunking_is_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let mut config = base_config();
        config.chunk_overlap = config.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChunking { .. })
        ));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut config = base_config();
        config.chunk_size = 0;
        config.chunk_overlap = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChunking { .. })
        ));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        // k = 0 would make every answer the no-context fallback.
        let mut config = base_config();
        config.top_k = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVar {
                var: "GROUNDER_TOP_K",
                ..
            })
        ));
    }
}
