//! In-memory chunk and document metadata store.
//!
//! The chunk sequence is the canonical mapping from vector-index position to
//! chunk metadata: a chunk's `id` is the position its vector occupied when it
//! was inserted. Deleting a document filters chunks out of the sequence but
//! never touches the vector index, so after a delete some positions no longer
//! resolve. Lookups go through [`ChunkStore::get`], which answers by stored
//! id, not by offset into the (now shorter) sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrieverError};

/// A span of extracted document text tied to an index position.
///
/// Immutable once created. `id` is stable only until a rebuild reassigns
/// positions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Position of this chunk's vector in the index at insertion time
    pub id: usize,
    pub document_id: String,
    pub document_name: String,
    /// 1-based source page
    pub page: usize,
    pub text: String,
}

/// A successfully ingested document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Chunk text with its source page, before an index position is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInput {
    pub text: String,
    pub page: usize,
}

/// Ordered chunk sequence plus the document registry.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    /// Chunks in insertion order; ids are strictly increasing
    chunks: Vec<Chunk>,
    /// Documents in registration order
    documents: Vec<Document>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a store from persisted state (persistence path).
    pub(crate) fn from_parts(chunks: Vec<Chunk>, documents: Vec<Document>) -> Result<Self> {
        if chunks.windows(2).any(|w| w[0].id >= w[1].id) {
            return Err(RetrieverError::persistence(
                "chunk ids are not strictly increasing",
            ));
        }
        Ok(Self { chunks, documents })
    }

    pub(crate) fn parts(&self) -> (&[Chunk], &[Document]) {
        (&self.chunks, &self.documents)
    }

    /// Append chunks, assigning `id = start_position + offset` in order.
    /// `start_position` must be the vector index size captured before the
    /// matching vectors were inserted, so positions and ids stay aligned.
    pub fn append(
        &mut self,
        document_id: &str,
        document_name: &str,
        inputs: &[ChunkInput],
        start_position: usize,
    ) {
        self.chunks
            .extend(inputs.iter().enumerate().map(|(offset, input)| Chunk {
                id: start_position + offset,
                document_id: document_id.to_string(),
                document_name: document_name.to_string(),
                page: input.page,
                text: input.text.clone(),
            }));
    }

    /// Register a document record. The id must be fresh.
    pub fn register_document(&mut self, document: Document) -> Result<()> {
        if self
            .documents
            .iter()
            .any(|d| d.document_id == document.document_id)
        {
            return Err(RetrieverError::validation(format!(
                "duplicate document id: {}",
                document.document_id
            )));
        }
        self.documents.push(document);
        Ok(())
    }

    /// Remove a document and every chunk that belongs to it. Returns false
    /// when the id is unknown. The vector index is deliberately untouched.
    pub fn remove_document(&mut self, document_id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.document_id != document_id);
        if self.documents.len() == before {
            return false;
        }
        self.chunks.retain(|c| c.document_id != document_id);
        true
    }

    /// The chunk whose vector sits at `position`, if it is still live.
    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks
            .binary_search_by_key(&position, |c| c.id)
            .ok()
            .map(|i| &self.chunks[i])
    }

    /// Documents in insertion order.
    pub fn list_documents(&self) -> &[Document] {
        &self.documents
    }

    /// Live chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Replace the chunk sequence with rebuilt, re-positioned chunks
    /// (rebuild path).
    pub(crate) fn replace_chunks(&mut self, chunks: Vec<Chunk>) {
        self.chunks = chunks;
    }
}
