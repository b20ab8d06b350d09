//! # quill-ai-embed
//!
//! Embedding generation for the quill-ai retrieval stack. The crate exposes a
//! small provider abstraction (batched text-to-vector generation with
//! distinct document and query modes) and a local ONNX implementation built
//! on FastEmbed, so indexing works without any external API.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quill_ai_embed::{EmbedConfig, EmbeddingMode, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//! let vectors = provider
//!     .embed(&["What is a B-tree?".to_string()], EmbeddingMode::Query)
//!     .await?;
//! assert_eq!(vectors[0].len(), provider.dimension());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modes
//!
//! Retrieval-tuned models embed documents and queries differently (usually by
//! an instruction prefix). [`EmbeddingMode`] carries that distinction through
//! the provider seam; [`EmbedConfig`] holds the per-mode prefixes.
//!
//! ## Caching
//!
//! Loaded models are cached process-wide keyed by model name, so constructing
//! several providers with the same configuration loads the model once.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingMode, EmbeddingProvider, FastEmbedProvider};
