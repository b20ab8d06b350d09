//! quill-ai-retriever: Retrieval-augmented question answering over PDFs
//!
//! This crate indexes PDF documents as embedded text chunks in a flat
//! vector index, answers similarity queries against them, and optionally
//! feeds the retrieved context through a language model to produce grounded
//! answers. State persists across restarts in a plain two-file format.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Flat vector index, chunk store, persistence, and the
//!   ingest and query pipelines
//! - **[`generation`]**: Prompt assembly and the language-model seam
//! - **[`config`]**: Tunables with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quill_ai_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//! use quill_ai_retriever::config::RetrieverConfig;
//! use quill_ai_retriever::retrieval::{
//!     DocumentIndex, IndexPersistence, IngestPipeline, RetrievalEngine,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
//! let config = RetrieverConfig::new("data").with_dimension(embedder.dimension());
//! let index = Arc::new(DocumentIndex::open(IndexPersistence::new(
//!     &config.data_dir,
//!     config.dimension,
//! ))?);
//!
//! let ingest = IngestPipeline::new(index.clone(), embedder.clone(), &config);
//! ingest.ingest_file(std::path::Path::new("notes.pdf")).await?;
//!
//! let engine = RetrievalEngine::new(index, embedder, config.default_top_k, config.max_top_k);
//! for hit in engine.retrieve("what is covered in chapter two?", None).await? {
//!     println!("{} (page {}): {:.3}", hit.chunk.document_name, hit.chunk.page, hit.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PDF bytes → extract → split → embed → DocumentIndex → disk
//!                                            ↑
//! Query → validate → embed → RetrievalEngine ┘→ AnswerPipeline → answer
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod retrieval;

pub use error::{Result, RetrieverError};
