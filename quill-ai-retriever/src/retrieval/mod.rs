//! Retrieval core: the flat vector index, chunk metadata, persistence, and
//! the pipelines that feed and query them.

pub mod chunk_store;
pub mod document_index;
pub mod engine;
pub mod ingest;
pub mod persistence;
pub mod vector_index;

pub use chunk_store::{Chunk, ChunkInput, ChunkStore, Document};
pub use document_index::{DocumentIndex, IndexStats, SearchHit};
pub use engine::{RetrievalEngine, ScoredChunk};
pub use ingest::{IngestPipeline, IngestReport};
pub use persistence::IndexPersistence;
pub use vector_index::VectorIndex;
