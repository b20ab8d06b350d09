//! Configuration for embedding models

use serde::{Deserialize, Serialize};

/// Configuration for an embedding provider.
///
/// The defaults select a small general-purpose model with no instruction
/// prefixes. Retrieval-tuned models that expect a query instruction get it
/// via [`EmbedConfig::bge_small`] or a custom `query_prefix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Model identifier, matched against the supported model registry
    pub model_name: String,
    /// Maximum number of texts embedded per inference call
    pub batch_size: usize,
    /// Prefix prepended to texts embedded in document mode
    pub document_prefix: String,
    /// Prefix prepended to texts embedded in query mode
    pub query_prefix: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::new("all-minilm-l6-v2")
    }
}

impl EmbedConfig {
    /// Create a configuration for the named model with default batching and
    /// no instruction prefixes.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: 16,
            document_prefix: String::new(),
            query_prefix: String::new(),
        }
    }

    /// BGE-small preset with the query instruction the model was trained on.
    pub fn bge_small() -> Self {
        Self::new("bge-small-en-v1.5").with_query_prefix(
            "Represent this sentence for searching relevant passages: ",
        )
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_document_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.document_prefix = prefix.into();
        self
    }

    pub fn with_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_prefixes() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name, "all-minilm-l6-v2");
        assert!(config.document_prefix.is_empty());
        assert!(config.query_prefix.is_empty());
    }

    #[test]
    fn bge_preset_carries_its_query_instruction() {
        let config = EmbedConfig::bge_small();
        assert!(config.query_prefix.starts_with("Represent this sentence"));
        assert!(config.document_prefix.is_empty());
    }

    #[test]
    fn batch_size_is_at_least_one() {
        let config = EmbedConfig::default().with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }
}
