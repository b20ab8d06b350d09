//! Error types for document extraction and splitting

/// Result type for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors raised while turning a source document into text chunks.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The PDF parser rejected the input bytes
    #[error("PDF extraction failed: {source}")]
    PdfExtraction {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The document parsed but produced no usable text (image-only or empty)
    #[error("document contains no extractable text")]
    NoText,
}
