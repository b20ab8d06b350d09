//! Configuration for the retrieval core and ingest pipeline.

use std::path::{Path, PathBuf};

/// Tunables for indexing, retrieval, and answer generation.
///
/// Defaults suit a single-user deployment over study material; every value
/// can be overridden with the builder methods or (for the CLI) environment
/// variables of the form `QUILL_CHUNK_SIZE`, `QUILL_TOP_K`, and so on.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Storage root holding the vector blob and metadata artifacts
    pub data_dir: PathBuf,
    /// Embedding dimension the index is opened with. The CLI replaces this
    /// with the live provider's dimension before opening the index.
    pub dimension: usize,
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters
    pub chunk_overlap: usize,
    /// Number of chunks retrieved when the caller does not say
    pub default_top_k: usize,
    /// Hard ceiling on caller-supplied top-k values
    pub max_top_k: usize,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Sampling temperature handed to the generator
    pub temperature: f32,
    /// Output token budget handed to the generator
    pub max_output_tokens: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dimension: 768,
            chunk_size: 1000,
            chunk_overlap: 200,
            default_top_k: 5,
            max_top_k: 10,
            max_upload_bytes: 16 * 1024 * 1024,
            temperature: 0.1,
            max_output_tokens: 500,
        }
    }
}

impl RetrieverConfig {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Apply `QUILL_*` environment overrides on top of the current values.
    /// Unset or unparsable variables leave the existing value in place.
    pub fn from_env(mut self) -> Self {
        if let Some(v) = env_parse::<usize>("QUILL_CHUNK_SIZE") {
            self.chunk_size = v;
        }
        if let Some(v) = env_parse::<usize>("QUILL_CHUNK_OVERLAP") {
            self.chunk_overlap = v;
        }
        if let Some(v) = env_parse::<usize>("QUILL_TOP_K") {
            self.default_top_k = v;
        }
        if let Some(v) = env_parse::<usize>("QUILL_MAX_TOP_K") {
            self.max_top_k = v;
        }
        if let Some(v) = env_parse::<usize>("QUILL_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = v;
        }
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_deployment() {
        let config = RetrieverConfig::default();
        assert_eq!(config.dimension, 768);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.max_top_k, 10);
    }

    #[test]
    fn builders_override_in_place() {
        let config = RetrieverConfig::new("/tmp/idx")
            .with_dimension(384)
            .with_max_top_k(20);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.dimension, 384);
        assert_eq!(config.max_top_k, 20);
        assert_eq!(config.chunk_size, 1000);
    }
}
