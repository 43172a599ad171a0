//! PDF loading.
//!
//! [`load_pdf`] turns a PDF on disk into ordered [`Page`] records using
//! `lopdf`. Pages that carry no text are skipped; a document without any text
//! is rejected so that the index is never built from nothing.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::document::Page;
use crate::error::{RagError, Result};

/// Load a PDF and return its non-empty pages in page order.
///
/// # Errors
///
/// - [`RagError::LoadError`] if the file cannot be read or parsed as a PDF,
///   or if text extraction fails for a page.
/// - [`RagError::EmptyDocument`] if no page contains any text.
pub fn load_pdf(path: impl AsRef<Path>) -> Result<Vec<Page>> {
    let path = path.as_ref();
    let source = path.display().to_string();

    let document = lopdf::Document::load(path).map_err(|e| RagError::LoadError {
        path: source.clone(),
        message: e.to_string(),
    })?;

    let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
    debug!(path = %source, page_count = page_numbers.len(), "parsed PDF");

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_number in page_numbers {
        let text = document.extract_text(&[page_number]).map_err(|e| RagError::LoadError {
            path: source.clone(),
            message: format!("failed to extract text from page {page_number}: {e}"),
        })?;

        if text.trim().is_empty() {
            warn!(path = %source, page_number, "skipping page without text");
            continue;
        }
        pages.push(Page::new(page_number, text));
    }

    if pages.is_empty() {
        return Err(RagError::EmptyDocument(source));
    }

    info!(path = %source, page_count = pages.len(), "loaded document");
    Ok(pages)
}
