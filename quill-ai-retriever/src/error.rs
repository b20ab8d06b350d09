//! Error types for the retrieval core.
//!
//! The taxonomy separates caller mistakes (`Validation`,
//! `DimensionMismatch`) from conditions that are not errors at all (an empty
//! index surfaces as an empty result at the engine layer) and from the two
//! fatal classes: `Persistence` (corrupt on-disk state, refuse to start) and
//! `PartialWrite` (vectors landed in the index but their metadata did not,
//! so the in-memory pair is inconsistent and must be reloaded from the last
//! persisted snapshot).

/// Result type for retrieval-core operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Errors raised by the vector index, chunk store, and their orchestration.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// Bad caller input: wrong file type, out-of-range query length,
    /// empty chunk list
    #[error("invalid input: {message}")]
    Validation { message: String },

    /// A vector's width does not match the index dimension
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search was attempted on an index with no rows; callers present this
    /// as "no results", not as a failure
    #[error("vector index is empty")]
    EmptyIndex,

    /// On-disk artifacts are unreadable, corrupt, or mutually inconsistent.
    /// Fatal at startup: the process must not proceed on a partial load.
    #[error("persistence failure: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vectors were inserted but the metadata update failed. There is no
    /// rollback for an index insert; recovery is a reload from the last
    /// persisted snapshot.
    #[error("partial write, index and metadata are out of sync: {message}")]
    PartialWrite { message: String },

    /// Failure in an external collaborator (embedder, generator, extractor)
    #[error("external service error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl RetrieverError {
    /// Build a validation error from a message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a persistence error from a message alone.
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error that corrupted or blocked a load/save.
    pub fn persistence_with<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a partial-write error from a message.
    pub fn partial_write<S: Into<String>>(message: S) -> Self {
        Self::PartialWrite {
            message: message.into(),
        }
    }
}
