//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Whether a text is being embedded as stored content or as a search query.
///
/// Retrieval-tuned models treat the two sides differently; the provider
/// applies the configured per-mode instruction prefix before inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// Text that will be stored in the index
    Document,
    /// Text used to search the index
    Query,
}

/// Trait for embedding providers that can generate embeddings from text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, batched internally.
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> Result<Vec<Vec<f32>>>;

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;

    /// Name/identifier of this provider.
    fn provider_name(&self) -> &str;
}

/// Cached model entries: (model, dimension)
type ModelCacheEntry = (Arc<Mutex<TextEmbedding>>, usize);

/// Process-wide cache of initialized models, keyed by model name.
static MODEL_CACHE: OnceLock<Mutex<HashMap<String, ModelCacheEntry>>> = OnceLock::new();

fn model_cache() -> &'static Mutex<HashMap<String, ModelCacheEntry>> {
    MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Local ONNX embedding provider backed by FastEmbed.
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Load (or reuse from the cache) the configured model and probe its
    /// dimension with a test embedding.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let model_kind = resolve_model(&config.model_name)?;

        let cached = {
            let cache = model_cache().lock().unwrap();
            cache
                .get(&config.model_name)
                .map(|(model, dim)| (Arc::clone(model), *dim))
        };
        if let Some((model, dimension)) = cached {
            tracing::debug!("reusing cached embedding model: {}", config.model_name);
            return Ok(Self {
                config,
                model,
                dimension,
            });
        }

        tracing::info!("loading embedding model: {}", config.model_name);
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                let init_options =
                    InitOptions::new(model_kind).with_show_download_progress(true);
                let mut model = TextEmbedding::try_new(init_options)
                    .map_err(|e| EmbedError::External { source: e })?;

                // Probe the dimension with a throwaway embedding
                let probe = model
                    .embed(vec!["dimension probe".to_string()], None)
                    .map_err(|e| EmbedError::External { source: e })?;
                let dimension = probe
                    .first()
                    .map(|emb| emb.len())
                    .ok_or_else(|| EmbedError::invalid_config("model produced no embedding"))?;

                Ok((model, dimension))
            })
            .await??;

        tracing::info!(
            "embedding model ready: {} (dimension {dimension})",
            config.model_name
        );

        let model = Arc::new(Mutex::new(model));
        {
            let mut cache = model_cache().lock().unwrap();
            cache.insert(config.model_name.clone(), (Arc::clone(&model), dimension));
        }

        Ok(Self {
            config,
            model,
            dimension,
        })
    }

    fn prefix_for(&self, mode: EmbeddingMode) -> &str {
        match mode {
            EmbeddingMode::Document => &self.config.document_prefix,
            EmbeddingMode::Query => &self.config.query_prefix,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prefix = self.prefix_for(mode);
        let prefixed: Vec<String> = if prefix.is_empty() {
            texts.to_vec()
        } else {
            texts.iter().map(|t| format!("{prefix}{t}")).collect()
        };

        tracing::debug!("embedding {} texts ({mode:?})", prefixed.len());

        let mut all_embeddings = Vec::with_capacity(prefixed.len());
        for batch in prefixed.chunks(self.config.batch_size) {
            let batch = batch.to_vec();
            let model = Arc::clone(&self.model);
            let batch_embeddings =
                tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                    let mut model = model.lock().unwrap();
                    model
                        .embed(batch, None)
                        .map_err(|e| EmbedError::External { source: e })
                })
                .await??;
            all_embeddings.extend(batch_embeddings);
        }

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}

/// Map a configured model name onto the FastEmbed registry.
fn resolve_model(name: &str) -> Result<EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        other => Err(EmbedError::invalid_config(format!(
            "unsupported embedding model: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_resolve() {
        assert!(resolve_model("all-minilm-l6-v2").is_ok());
        assert!(resolve_model("bge-small-en-v1.5").is_ok());
    }

    #[test]
    fn unknown_model_is_an_invalid_config() {
        let err = resolve_model("definitely-not-a-model").unwrap_err();
        assert!(matches!(err, EmbedError::InvalidConfig { .. }));
    }

    #[tokio::test]
    #[ignore] // Integration test: downloads a real model - run with: cargo test -- --ignored
    async fn minilm_embeds_and_reports_a_consistent_dimension() -> anyhow::Result<()> {
        let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
        assert_eq!(provider.provider_name(), "fastembed");

        let texts = vec![
            "binary search trees keep keys in sorted order".to_string(),
            "hash tables trade ordering for constant-time lookup".to_string(),
        ];
        let document_vectors = provider.embed(&texts, EmbeddingMode::Document).await?;
        assert_eq!(document_vectors.len(), 2);
        for vector in &document_vectors {
            assert_eq!(vector.len(), provider.dimension());
            assert!(vector.iter().all(|v| v.is_finite()));
        }

        let query_vectors = provider
            .embed(&["what is a hash table".to_string()], EmbeddingMode::Query)
            .await?;
        assert_eq!(query_vectors[0].len(), provider.dimension());
        Ok(())
    }
}
