//! Query-facing retrieval: validate, embed, search, shape.
//!
//! The engine is the only place that turns raw user queries into vectors.
//! It owns the query-side guardrails (length bounds, top-k clamping) so the
//! index and store below it never see unchecked input.

use std::sync::Arc;

use quill_ai_embed::{EmbeddingMode, EmbeddingProvider};
use serde::Serialize;
use tracing::debug;

use super::chunk_store::Chunk;
use super::document_index::DocumentIndex;
use crate::error::{Result, RetrieverError};

const MIN_QUERY_CHARS: usize = 3;
const MAX_QUERY_CHARS: usize = 1000;

/// A retrieved chunk with its squared L2 distance (lower is closer).
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

/// Embeds queries and ranks chunks against the document index.
pub struct RetrievalEngine {
    index: Arc<DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    default_top_k: usize,
    max_top_k: usize,
}

impl RetrievalEngine {
    pub fn new(
        index: Arc<DocumentIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        default_top_k: usize,
        max_top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            default_top_k,
            max_top_k,
        }
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// Retrieve the chunks most similar to `query`, best first.
    ///
    /// `top_k` falls back to the configured default when `None` and is
    /// clamped into `1..=max_top_k` otherwise. An empty index yields an
    /// empty result, not an error.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        validate_query(query)?;
        let k = top_k
            .unwrap_or(self.default_top_k)
            .clamp(1, self.max_top_k);

        let embedded = self
            .embedder
            .embed(&[query.to_string()], EmbeddingMode::Query)
            .await
            .map_err(|e| RetrieverError::External {
                source: anyhow::Error::from(e),
            })?;
        let vector = embedded.into_iter().next().ok_or_else(|| {
            RetrieverError::External {
                source: anyhow::anyhow!("embedding provider returned no vector for the query"),
            }
        })?;
        if vector.len() != self.index.dimension() {
            return Err(RetrieverError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: vector.len(),
            });
        }

        let hits = self.index.search(&vector, k).await?;
        debug!(k, hits = hits.len(), "retrieval complete");
        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                chunk: hit.chunk,
                score: hit.distance,
            })
            .collect())
    }
}

/// Query bounds: at least three non-whitespace-trimmed characters, at most
/// a thousand characters raw.
fn validate_query(query: &str) -> Result<()> {
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        return Err(RetrieverError::validation(format!(
            "query must contain at least {MIN_QUERY_CHARS} characters"
        )));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(RetrieverError::validation(format!(
            "query must not exceed {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_whitespace_queries_are_rejected() {
        assert!(validate_query("hi").is_err());
        assert!(validate_query("   a   ").is_err());
        assert!(validate_query("abc").is_ok());
    }

    #[test]
    fn overlong_queries_are_rejected() {
        let long = "q".repeat(MAX_QUERY_CHARS + 1);
        assert!(validate_query(&long).is_err());
        let at_limit = "q".repeat(MAX_QUERY_CHARS);
        assert!(validate_query(&at_limit).is_ok());
    }
}
