//! Error types for embedding generation

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors raised while loading models or generating embeddings.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The provider configuration is unusable (unknown model, bad batch size)
    #[error("invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The model failed to load or produced unusable test output
    #[error("model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A blocking inference task panicked or was cancelled
    #[error("async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Failure inside the underlying embedding library
    #[error("embedding generation failed: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Wrap an error that occurred while loading or validating a model.
    pub fn model_init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInitialization {
            source: Box::new(source),
        }
    }

    /// Build an invalid-configuration error from a message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
