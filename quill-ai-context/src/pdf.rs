//! Per-page text extraction from PDF bytes.
//!
//! Extraction itself is delegated to the `pdf-extract` crate; this module's
//! job is to carve the extracted text back into pages (the extractor emits a
//! form feed at each page break) and drop pages with no usable text, so that
//! every chunk downstream carries a 1-based page number.

use crate::error::{ContextError, Result};

/// Text of a single PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    /// 1-based page number in the source document
    pub page: usize,
    pub text: String,
}

/// Extract the text of every non-blank page from PDF bytes.
///
/// Returns [`ContextError::NoText`] when the document parses but yields no
/// text at all (typically a scanned/image-only PDF) so callers can reject
/// the upload instead of indexing an empty document.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PdfPage>> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        ContextError::PdfExtraction {
            source: Box::new(e),
        }
    })?;

    let pages = pages_from_text(&text);
    if pages.is_empty() {
        return Err(ContextError::NoText);
    }

    tracing::debug!("extracted text from {} pages", pages.len());
    Ok(pages)
}

/// Split extracted text on form-feed page breaks, keeping original page
/// numbering for the pages that survive the blank filter.
fn pages_from_text(text: &str) -> Vec<PdfPage> {
    text.split('\u{0C}')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(i, page_text)| PdfPage {
            page: i + 1,
            text: page_text.to_string(),
        })
        .collect()
}
