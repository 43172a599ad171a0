//! Data types for pages, chunks, and search results.

use serde::{Deserialize, Serialize};

/// Text extracted from a single page of the source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number in the source document.
    pub page_number: u32,
    /// The extracted text of the page.
    pub text: String,
}

impl Page {
    /// Create a page record.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self { page_number, text: text.into() }
    }
}

/// A token window over a single [`Page`].
///
/// Token offsets are relative to the start of the page, so two chunks of the
/// same page overlap by `previous.token_end - next.token_start` tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Identifier of the form `page-{page_number}-chunk-{index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The page this chunk was cut from.
    pub page_number: u32,
    /// Offset of the first token of this chunk within its page.
    pub token_start: usize,
    /// Offset one past the last token of this chunk within its page.
    pub token_end: usize,
}

impl Chunk {
    /// Number of tokens covered by this chunk.
    pub fn token_count(&self) -> usize {
        self.token_end - self.token_start
    }
}

/// A retrieved [`Chunk`] paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
