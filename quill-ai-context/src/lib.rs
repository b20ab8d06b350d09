//! # quill-ai-context
//!
//! Turns uploaded study documents into embeddable text chunks. Two stages:
//!
//! - [`pdf`]: extract per-page text from PDF bytes
//! - [`splitter`]: split page text into overlapping chunks sized for an
//!   embedding model's input window
//!
//! Both stages are synchronous and CPU-bound; callers that live on an async
//! runtime should wrap them in `spawn_blocking`.

pub mod error;
pub mod pdf;
pub mod splitter;

pub use error::{ContextError, Result};
pub use pdf::{PdfPage, extract_pages};
pub use splitter::TextSplitter;
