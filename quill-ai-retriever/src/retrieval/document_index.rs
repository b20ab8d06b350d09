//! Coordinated document-level view over the vector index and chunk store.
//!
//! [`DocumentIndex`] owns both halves behind one `RwLock` so every write
//! (add, delete, rebuild) sees and leaves a consistent pair, and searches
//! run concurrently against a stable snapshot. It also owns persistence:
//! each successful mutation is flushed to disk before the call returns.
//!
//! Deletion is metadata-only. The document's vectors stay in the index as
//! unreferenced rows; search filters them out by failing the position lookup.
//! [`DocumentIndex::rebuild`] compacts those rows away by copying the live
//! vectors into a fresh index and renumbering chunk positions.

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::chunk_store::{Chunk, ChunkInput, ChunkStore, Document};
use super::persistence::IndexPersistence;
use super::vector_index::VectorIndex;
use crate::error::{Result, RetrieverError};

/// The state guarded by the single lock.
#[derive(Debug)]
struct IndexState {
    index: VectorIndex,
    store: ChunkStore,
    /// Monotonic counter baked into document ids; persisted so ids stay
    /// unique across restarts even after deletions
    next_doc_seq: u64,
}

/// A search hit before engine-level shaping: the live chunk plus its
/// squared L2 distance.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Counters describing the current index, for status output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub live_chunks: usize,
    pub index_rows: usize,
    pub dimension: usize,
}

/// Thread-safe document index with write-through persistence.
#[derive(Debug)]
pub struct DocumentIndex {
    inner: RwLock<IndexState>,
    persistence: IndexPersistence,
    /// Fixed at open time; mirrors the index so readers skip the lock
    dimension: usize,
}

impl DocumentIndex {
    /// Open the index rooted at the persistence directory, loading any
    /// persisted state or starting empty.
    pub fn open(persistence: IndexPersistence) -> Result<Self> {
        let loaded = persistence.load()?;
        let dimension = loaded.index.dimension();
        Ok(Self {
            inner: RwLock::new(IndexState {
                index: loaded.index,
                store: loaded.store,
                next_doc_seq: loaded.next_doc_seq,
            }),
            persistence,
            dimension,
        })
    }

    /// Add a document's chunks and their embeddings as one unit.
    ///
    /// Chunks and vectors must be parallel and non-empty; every vector must
    /// match the index dimension. Validation happens before any mutation.
    /// Returns the generated document id.
    pub async fn add_document(
        &self,
        filename: &str,
        chunks: Vec<ChunkInput>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<String> {
        if chunks.is_empty() {
            return Err(RetrieverError::validation(
                "a document must contain at least one chunk",
            ));
        }
        if chunks.len() != vectors.len() {
            return Err(RetrieverError::validation(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut state = self.inner.write().await;
        for vector in &vectors {
            if vector.len() != state.index.dimension() {
                return Err(RetrieverError::DimensionMismatch {
                    expected: state.index.dimension(),
                    actual: vector.len(),
                });
            }
        }

        let document_id = format!("doc_{}_{}", state.next_doc_seq, Utc::now().timestamp());
        state.next_doc_seq += 1;

        let start_position = state.index.len();
        state.index.insert(&vectors)?;

        // The index insert cannot be rolled back. Any failure past this
        // point leaves the in-memory pair inconsistent and is surfaced as
        // PartialWrite so the caller knows to reload.
        state
            .store
            .append(&document_id, filename, &chunks, start_position);
        let register = state.store.register_document(Document {
            document_id: document_id.clone(),
            filename: filename.to_string(),
            chunk_count: chunks.len(),
            uploaded_at: Utc::now(),
        });
        if let Err(e) = register {
            return Err(RetrieverError::partial_write(format!(
                "vectors inserted but document registration failed: {e}"
            )));
        }

        self.persist(&state)?;
        info!(
            document_id = %document_id,
            filename,
            chunks = chunks.len(),
            "indexed document"
        );
        Ok(document_id)
    }

    /// Exact k-NN over the live chunks. An empty index yields an empty
    /// result. Rows whose chunks were deleted are skipped, so fewer than
    /// `k` hits can come back even on a large index.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let state = self.inner.read().await;
        let scored = match state.index.search(query, k) {
            Ok(scored) => scored,
            Err(RetrieverError::EmptyIndex) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(scored
            .into_iter()
            .filter_map(|(position, distance)| {
                state.store.get(position).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    distance,
                })
            })
            .collect())
    }

    /// Remove a document's metadata. Returns false when the id is unknown.
    /// The vectors remain until the next [`DocumentIndex::rebuild`].
    pub async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let mut state = self.inner.write().await;
        if !state.store.remove_document(document_id) {
            return Ok(false);
        }
        self.persist(&state)?;
        info!(document_id, "deleted document metadata");
        Ok(true)
    }

    /// Compact the index down to the vectors of live chunks, renumbering
    /// chunk positions from zero. Returns the number of rows reclaimed.
    pub async fn rebuild(&self) -> Result<usize> {
        let mut state = self.inner.write().await;
        let before = state.index.len();

        let mut fresh = VectorIndex::new(state.index.dimension());
        let mut renumbered = Vec::with_capacity(state.store.chunk_count());
        for (new_id, chunk) in state.store.chunks().iter().enumerate() {
            let row = state.index.row(chunk.id).ok_or_else(|| {
                RetrieverError::persistence(format!(
                    "chunk {} references missing index row {}",
                    chunk.document_id, chunk.id
                ))
            })?;
            fresh.insert(&[row.to_vec()])?;
            let mut chunk = chunk.clone();
            chunk.id = new_id;
            renumbered.push(chunk);
        }

        state.index = fresh;
        state.store.replace_chunks(renumbered);
        self.persist(&state)?;

        let reclaimed = before - state.index.len();
        if reclaimed > 0 {
            info!(reclaimed, rows = state.index.len(), "rebuilt vector index");
        } else {
            info!(rows = state.index.len(), "rebuild found nothing to reclaim");
        }
        Ok(reclaimed)
    }

    /// Documents in upload order.
    pub async fn list_documents(&self) -> Vec<Document> {
        self.inner.read().await.store.list_documents().to_vec()
    }

    pub async fn stats(&self) -> IndexStats {
        let state = self.inner.read().await;
        IndexStats {
            documents: state.store.document_count(),
            live_chunks: state.store.chunk_count(),
            index_rows: state.index.len(),
            dimension: state.index.dimension(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn persist(&self, state: &IndexState) -> Result<()> {
        if let Err(e) = self
            .persistence
            .save(&state.index, &state.store, state.next_doc_seq)
        {
            warn!(error = %e, "failed to persist index state");
            return Err(e);
        }
        Ok(())
    }
}
