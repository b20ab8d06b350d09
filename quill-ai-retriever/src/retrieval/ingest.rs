//! PDF ingest pipeline: extract, split, embed, index.
//!
//! One document flows through in a single call. Extraction and splitting are
//! CPU-bound and run on the blocking pool; embedding batches through the
//! provider; the final add is one atomic unit against the document index.

use std::path::Path;
use std::sync::Arc;

use quill_ai_context::{ContextError, TextSplitter, extract_pages};
use quill_ai_embed::{EmbeddingMode, EmbeddingProvider};
use serde::Serialize;
use tracing::{info, warn};

use super::chunk_store::ChunkInput;
use super::document_index::DocumentIndex;
use crate::config::RetrieverConfig;
use crate::error::{Result, RetrieverError};

/// What one successful ingest produced.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub filename: String,
    pub chunk_count: usize,
}

/// Turns PDF bytes into indexed, searchable chunks.
pub struct IngestPipeline {
    index: Arc<DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    splitter: TextSplitter,
    max_upload_bytes: usize,
}

impl IngestPipeline {
    pub fn new(
        index: Arc<DocumentIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RetrieverConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Ingest one PDF from raw bytes.
    ///
    /// `filename` must end in `.pdf` (case-insensitive) and the payload must
    /// fit the upload limit. Image-only PDFs fail validation rather than
    /// indexing an empty document.
    pub async fn ingest_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<IngestReport> {
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(RetrieverError::validation(format!(
                "only PDF files are accepted, got {filename:?}"
            )));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(RetrieverError::validation(format!(
                "{filename} is {} bytes, the limit is {}",
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        let splitter = self.splitter.clone();
        let chunks = tokio::task::spawn_blocking(move || -> Result<Vec<ChunkInput>> {
            let pages = extract_pages(&bytes).map_err(|e| match e {
                ContextError::NoText => {
                    RetrieverError::validation("the PDF contains no extractable text")
                }
                other => RetrieverError::External {
                    source: anyhow::Error::from(other),
                },
            })?;
            Ok(pages
                .into_iter()
                .flat_map(|page| {
                    splitter
                        .split(&page.text)
                        .into_iter()
                        .map(move |text| ChunkInput {
                            text,
                            page: page.page,
                        })
                        .collect::<Vec<_>>()
                })
                .collect())
        })
        .await
        .map_err(|e| RetrieverError::External {
            source: anyhow::Error::from(e),
        })??;

        if chunks.is_empty() {
            return Err(RetrieverError::validation(
                "the PDF contains no extractable text",
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed(&texts, EmbeddingMode::Document)
            .await
            .map_err(|e| RetrieverError::External {
                source: anyhow::Error::from(e),
            })?;

        let chunk_count = chunks.len();
        let document_id = self.index.add_document(filename, chunks, vectors).await?;
        info!(document_id = %document_id, filename, chunk_count, "ingested document");
        Ok(IngestReport {
            document_id,
            filename: filename.to_string(),
            chunk_count,
        })
    }

    /// Ingest one PDF from disk, naming the document after the file.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RetrieverError::validation(format!("{} has no usable file name", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RetrieverError::persistence_with(format!("failed to read {}", path.display()), e)
        })?;
        self.ingest_bytes(&filename, bytes).await
    }

    /// Ingest every `.pdf` directly inside `dir`, skipping files that fail
    /// with a warning. Returns reports for the documents that made it in.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<Vec<IngestReport>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            RetrieverError::persistence_with(format!("failed to list {}", dir.display()), e)
        })?;

        let mut reports = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            RetrieverError::persistence_with(format!("failed to list {}", dir.display()), e)
        })? {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !path.is_file() || !is_pdf {
                continue;
            }
            match self.ingest_file(&path).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
            }
        }
        Ok(reports)
    }
}
