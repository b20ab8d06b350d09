//! On-disk persistence for the vector index and chunk metadata.
//!
//! Two sibling artifacts under the data directory:
//!
//! - `vectors.bin`: a fixed header (magic, format version, dimension, row
//!   count) followed by the packed little-endian f32 index data.
//! - `metadata.json`: chunks, documents, and the document id sequence
//!   counter, as versioned JSON.
//!
//! Each artifact is replaced via write-to-temp-then-rename, so a single file
//! is never observed half-written. There is no cross-file transaction; a
//! crash between the two renames can leave the pair out of step, which load
//! detects and reports as corruption rather than guessing.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::chunk_store::{Chunk, ChunkStore, Document};
use super::vector_index::VectorIndex;
use crate::error::{Result, RetrieverError};

const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";

const VECTORS_MAGIC: &[u8; 4] = b"QVIX";
const VECTORS_FORMAT_VERSION: u32 = 1;
const METADATA_FORMAT_VERSION: u32 = 1;

/// Header is magic + version + dimension (u32 each) + row count (u64).
const VECTORS_HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedMetadata {
    version: u32,
    next_doc_seq: u64,
    chunks: Vec<Chunk>,
    documents: Vec<Document>,
}

/// Everything a [`super::document_index::DocumentIndex`] needs to resume.
#[derive(Debug)]
pub struct LoadedState {
    pub index: VectorIndex,
    pub store: ChunkStore,
    pub next_doc_seq: u64,
}

/// Saves and loads the index/metadata artifact pair for one data directory.
#[derive(Debug, Clone)]
pub struct IndexPersistence {
    root: PathBuf,
    dimension: usize,
}

impl IndexPersistence {
    pub fn new(root: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            root: root.into(),
            dimension,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn vectors_path(&self) -> PathBuf {
        self.root.join(VECTORS_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Persist both artifacts. The vector blob is written first so a crash
    /// in between leaves new vectors with old metadata, never dangling
    /// metadata that points past the end of the blob.
    pub fn save(&self, index: &VectorIndex, store: &ChunkStore, next_doc_seq: u64) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            RetrieverError::persistence_with(
                format!("failed to create data directory {}", self.root.display()),
                e,
            )
        })?;

        self.write_vectors(index)?;
        self.write_metadata(store, next_doc_seq)?;
        debug!(
            rows = index.len(),
            chunks = store.chunk_count(),
            documents = store.document_count(),
            "persisted index state"
        );
        Ok(())
    }

    /// Load the artifact pair, or bootstrap an empty state when neither file
    /// exists yet. Exactly one file present means a torn previous run and is
    /// reported as corruption.
    pub fn load(&self) -> Result<LoadedState> {
        let vectors_path = self.vectors_path();
        let metadata_path = self.metadata_path();

        match (vectors_path.exists(), metadata_path.exists()) {
            (false, false) => {
                info!(root = %self.root.display(), "no persisted state, starting empty");
                Ok(LoadedState {
                    index: VectorIndex::new(self.dimension),
                    store: ChunkStore::new(),
                    next_doc_seq: 1,
                })
            }
            (true, false) => Err(RetrieverError::persistence(format!(
                "{} exists but {} is missing",
                vectors_path.display(),
                metadata_path.display()
            ))),
            (false, true) => Err(RetrieverError::persistence(format!(
                "{} exists but {} is missing",
                metadata_path.display(),
                vectors_path.display()
            ))),
            (true, true) => {
                let index = self.read_vectors(&vectors_path)?;
                let (store, next_doc_seq) = self.read_metadata(&metadata_path, index.len())?;
                info!(
                    rows = index.len(),
                    chunks = store.chunk_count(),
                    documents = store.document_count(),
                    "loaded persisted index state"
                );
                Ok(LoadedState {
                    index,
                    store,
                    next_doc_seq,
                })
            }
        }
    }

    fn write_vectors(&self, index: &VectorIndex) -> Result<()> {
        let data = index.as_flat();
        let mut buf = Vec::with_capacity(VECTORS_HEADER_LEN + data.len() * 4);
        buf.extend_from_slice(VECTORS_MAGIC);
        buf.extend_from_slice(&VECTORS_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
        buf.extend_from_slice(&(index.len() as u64).to_le_bytes());
        buf.extend_from_slice(bytemuck::cast_slice(data));
        self.replace_file(&self.vectors_path(), &buf)
    }

    fn write_metadata(&self, store: &ChunkStore, next_doc_seq: u64) -> Result<()> {
        let (chunks, documents) = store.parts();
        let persisted = PersistedMetadata {
            version: METADATA_FORMAT_VERSION,
            next_doc_seq,
            chunks: chunks.to_vec(),
            documents: documents.to_vec(),
        };
        let json = serde_json::to_vec(&persisted).map_err(|e| {
            RetrieverError::persistence_with("failed to serialize metadata", e)
        })?;
        self.replace_file(&self.metadata_path(), &json)
    }

    fn replace_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| {
            RetrieverError::persistence_with(format!("failed to create {}", tmp.display()), e)
        })?;
        file.write_all(contents).map_err(|e| {
            RetrieverError::persistence_with(format!("failed to write {}", tmp.display()), e)
        })?;
        file.sync_all().map_err(|e| {
            RetrieverError::persistence_with(format!("failed to sync {}", tmp.display()), e)
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            RetrieverError::persistence_with(
                format!("failed to rename {} into place", tmp.display()),
                e,
            )
        })
    }

    fn read_vectors(&self, path: &Path) -> Result<VectorIndex> {
        let bytes = fs::read(path).map_err(|e| {
            RetrieverError::persistence_with(format!("failed to read {}", path.display()), e)
        })?;
        if bytes.len() < VECTORS_HEADER_LEN {
            return Err(RetrieverError::persistence(format!(
                "{} is truncated ({} bytes)",
                path.display(),
                bytes.len()
            )));
        }
        if &bytes[0..4] != VECTORS_MAGIC {
            return Err(RetrieverError::persistence(format!(
                "{} has an unrecognized magic number",
                path.display()
            )));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != VECTORS_FORMAT_VERSION {
            return Err(RetrieverError::persistence(format!(
                "{} has unsupported format version {version}",
                path.display()
            )));
        }
        let dimension = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        if dimension != self.dimension {
            return Err(RetrieverError::persistence(format!(
                "{} stores dimension {dimension} but the configured dimension is {}",
                path.display(),
                self.dimension
            )));
        }
        let count = u64::from_le_bytes(bytes[12..20].try_into().unwrap()) as usize;
        let payload = &bytes[VECTORS_HEADER_LEN..];
        let expected_bytes = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                RetrieverError::persistence(format!("{} header overflows", path.display()))
            })?;
        if payload.len() != expected_bytes {
            return Err(RetrieverError::persistence(format!(
                "{} payload is {} bytes, header promises {}",
                path.display(),
                payload.len(),
                expected_bytes
            )));
        }

        // Alignment of the source slice is not guaranteed, so decode per row.
        let mut data = Vec::with_capacity(count * dimension);
        for raw in payload.chunks_exact(4) {
            data.push(f32::from_le_bytes(raw.try_into().unwrap()));
        }
        VectorIndex::from_raw(dimension, data)
    }

    fn read_metadata(&self, path: &Path, index_len: usize) -> Result<(ChunkStore, u64)> {
        let bytes = fs::read(path).map_err(|e| {
            RetrieverError::persistence_with(format!("failed to read {}", path.display()), e)
        })?;
        let persisted: PersistedMetadata = serde_json::from_slice(&bytes).map_err(|e| {
            RetrieverError::persistence_with(format!("failed to parse {}", path.display()), e)
        })?;
        if persisted.version != METADATA_FORMAT_VERSION {
            return Err(RetrieverError::persistence(format!(
                "{} has unsupported format version {}",
                path.display(),
                persisted.version
            )));
        }
        if let Some(chunk) = persisted.chunks.iter().find(|c| c.id >= index_len) {
            return Err(RetrieverError::persistence(format!(
                "chunk {} points at index position {} but the index holds {} rows",
                chunk.document_id, chunk.id, index_len
            )));
        }
        let store = ChunkStore::from_parts(persisted.chunks, persisted.documents)?;
        Ok((store, persisted.next_doc_seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::chunk_store::ChunkInput;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_state(dimension: usize) -> (VectorIndex, ChunkStore) {
        let mut index = VectorIndex::new(dimension);
        index
            .insert(&[vec![1.0; dimension], vec![2.0; dimension]])
            .unwrap();
        let mut store = ChunkStore::new();
        store.append(
            "doc_1_100",
            "report.pdf",
            &[
                ChunkInput {
                    text: "first".into(),
                    page: 1,
                },
                ChunkInput {
                    text: "second".into(),
                    page: 2,
                },
            ],
            0,
        );
        store
            .register_document(Document {
                document_id: "doc_1_100".into(),
                filename: "report.pdf".into(),
                chunk_count: 2,
                uploaded_at: Utc::now(),
            })
            .unwrap();
        (index, store)
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path(), 4);
        let (index, store) = sample_state(4);

        persistence.save(&index, &store, 2).unwrap();
        let loaded = persistence.load().unwrap();

        assert_eq!(loaded.index.len(), 2);
        assert_eq!(loaded.index.row(1), index.row(1));
        assert_eq!(loaded.store.chunks(), store.chunks());
        assert_eq!(loaded.store.list_documents(), store.list_documents());
        assert_eq!(loaded.next_doc_seq, 2);
        // no stray temp files left behind
        assert!(!dir.path().join("vectors.tmp").exists());
        assert!(!dir.path().join("metadata.tmp").exists());
    }

    #[test]
    fn empty_directory_bootstraps_fresh_state() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path().join("nested"), 4);
        let loaded = persistence.load().unwrap();
        assert!(loaded.index.is_empty());
        assert_eq!(loaded.store.document_count(), 0);
        assert_eq!(loaded.next_doc_seq, 1);
    }

    #[test]
    fn a_lone_artifact_is_reported_as_corruption() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path(), 4);
        let (index, store) = sample_state(4);
        persistence.save(&index, &store, 2).unwrap();

        fs::remove_file(dir.path().join(METADATA_FILE)).unwrap();
        let err = persistence.load().unwrap_err();
        assert!(matches!(err, RetrieverError::Persistence { .. }));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path(), 4);
        let (index, store) = sample_state(4);
        persistence.save(&index, &store, 2).unwrap();

        let path = dir.path().join(VECTORS_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = b'X';
        fs::write(&path, bytes).unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, RetrieverError::Persistence { .. }));
    }

    #[test]
    fn dimension_mismatch_with_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (index, store) = sample_state(4);
        IndexPersistence::new(dir.path(), 4)
            .save(&index, &store, 2)
            .unwrap();

        let err = IndexPersistence::new(dir.path(), 8).load().unwrap_err();
        assert!(matches!(err, RetrieverError::Persistence { .. }));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path(), 4);
        let (index, store) = sample_state(4);
        persistence.save(&index, &store, 2).unwrap();

        let path = dir.path().join(VECTORS_FILE);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, RetrieverError::Persistence { .. }));
    }

    #[test]
    fn metadata_pointing_past_the_index_is_rejected() {
        let dir = TempDir::new().unwrap();
        let persistence = IndexPersistence::new(dir.path(), 4);
        let (index, mut store) = sample_state(4);
        store.append(
            "doc_2_200",
            "extra.pdf",
            &[ChunkInput {
                text: "dangling".into(),
                page: 1,
            }],
            5,
        );
        persistence.save(&index, &store, 3).unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, RetrieverError::Persistence { .. }));
    }
}
