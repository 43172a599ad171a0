//! Page chunking.
//!
//! This module provides the [`Chunker`] trait and [`TokenChunker`], which cuts
//! each page into overlapping windows measured in `cl100k_base` tokens.
//!
//! Windows never split a multi-byte character: tokens are first grouped into
//! the smallest runs that decode to valid UTF-8, and windows are laid over
//! those runs. For ordinary text every run is a single token, so a window is
//! exactly `chunk_size` tokens and consecutive windows share exactly
//! `chunk_overlap` tokens.

use std::fmt;

use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::config::RagConfig;
use crate::document::{Chunk, Page};
use crate::error::{RagError, Result};

/// A strategy for splitting pages into chunks.
pub trait Chunker: Send + Sync {
    /// Split a single page into chunks.
    ///
    /// Returns an empty `Vec` if the page has empty text.
    fn chunk(&self, page: &Page) -> Result<Vec<Chunk>>;

    /// Split every page, preserving page order.
    fn chunk_pages(&self, pages: &[Page]) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for page in pages {
            all_chunks.extend(self.chunk(page)?);
        }
        Ok(all_chunks)
    }
}

/// Splits pages into fixed-size token windows with overlap.
///
/// # Example
///
/// ```rust,ignore
/// use persona_rag::TokenChunker;
///
/// let chunker = TokenChunker::new(512, 50)?;
/// let chunks = chunker.chunk_pages(&pages)?;
/// ```
pub struct TokenChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    bpe: CoreBPE,
}

impl fmt::Debug for TokenChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenChunker")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}

impl TokenChunker {
    /// Create a new `TokenChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of tokens per chunk
    /// * `chunk_overlap`: number of tokens shared by consecutive chunks of a page
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or not greater
    /// than `chunk_overlap`, and [`RagError::SplitError`] if the tokenizer
    /// cannot be loaded.
    ///
    /// Windows never split a character, so text whose characters span several
    /// tokens each can make an overlap close to `chunk_size` impossible to keep.
    /// [`Chunker::chunk`] then fails with [`RagError::SplitError`] instead of
    /// sharing fewer tokens.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }

        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| RagError::SplitError(format!("failed to load tokenizer: {e}")))?;

        Ok(Self { chunk_size, chunk_overlap, bpe })
    }

    /// Create a chunker from the sizes in a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Group the tokens of `text` into the shortest runs that decode to valid UTF-8.
    fn pieces(&self, text: &str) -> Result<Vec<Piece>> {
        let tokens = self.bpe.encode_ordinary(text);
        let mut pieces = Vec::with_capacity(tokens.len());
        let mut pending = Vec::new();

        for token in tokens {
            pending.push(token);
            if let Ok(text) = self.bpe.decode(pending.clone()) {
                pieces.push(Piece { text, tokens: pending.len() });
                pending.clear();
            }
        }

        if !pending.is_empty() {
            return Err(RagError::SplitError(format!(
                "{} trailing tokens do not decode to valid UTF-8",
                pending.len()
            )));
        }

        Ok(pieces)
    }
}

/// A run of tokens that decodes to valid UTF-8 on its own.
struct Piece {
    text: String,
    tokens: usize,
}

impl Chunker for TokenChunker {
    fn chunk(&self, page: &Page) -> Result<Vec<Chunk>> {
        if page.text.is_empty() {
            return Ok(Vec::new());
        }

        let pieces = self.pieces(&page.text)?;

        // offsets[i] is the token offset where piece i starts
        let mut offsets = Vec::with_capacity(pieces.len() + 1);
        offsets.push(0usize);
        for piece in &pieces {
            offsets.push(offsets[offsets.len() - 1] + piece.tokens);
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < pieces.len() {
            let mut end = start;
            while end < pieces.len() && offsets[end + 1] - offsets[start] <= self.chunk_size {
                end += 1;
            }
            if end == start {
                return Err(RagError::SplitError(format!(
                    "a {}-token character run on page {} exceeds chunk_size ({})",
                    pieces[start].tokens, page.page_number, self.chunk_size
                )));
            }

            let text: String = pieces[start..end].iter().map(|p| p.text.as_str()).collect();
            chunks.push(Chunk {
                id: format!("page-{}-chunk-{}", page.page_number, chunks.len()),
                text,
                page_number: page.page_number,
                token_start: offsets[start],
                token_end: offsets[end],
            });

            if end == pieces.len() {
                break;
            }

            // Step back from the window end until the overlap is covered, but
            // always make progress.
            let mut next = end;
            while next > start + 1 && offsets[end] - offsets[next] < self.chunk_overlap {
                next -= 1;
            }
            if offsets[end] - offsets[next] < self.chunk_overlap {
                return Err(RagError::SplitError(format!(
                    "cannot share {} tokens between chunks on page {}: the window at tokens {}..{} holds too few whole characters",
                    self.chunk_overlap, page.page_number, offsets[start], offsets[end]
                )));
            }
            start = next;
        }

        debug!(
            page_number = page.page_number,
            token_count = offsets[offsets.len() - 1],
            chunk_count = chunks.len(),
            "chunked page"
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = TokenChunker::new(10, 10).unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(matches!(TokenChunker::new(0, 0), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn empty_page_yields_no_chunks() {
        let chunker = TokenChunker::new(16, 4).unwrap();
        assert!(chunker.chunk(&Page::new(1, "")).unwrap().is_empty());
    }

    #[test]
    fn short_page_is_a_single_chunk() {
        let chunker = TokenChunker::new(512, 50).unwrap();
        let page = Page::new(3, "My name is Alex and I am a chef.");
        let chunks = chunker.chunk(&page).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, page.text);
        assert_eq!(chunks[0].id, "page-3-chunk-0");
        assert_eq!(chunks[0].token_start, 0);
    }

    #[test]
    fn multibyte_text_is_never_split_mid_character() {
        let chunker = TokenChunker::new(16, 2).unwrap();
        let text = "パンを焼くのが大好きです。毎朝、店でクロワッサンを作ります。".repeat(4);
        let chunks = chunker.chunk(&Page::new(1, text.clone())).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(text.contains(&chunk.text));
        }
    }

    #[test]
    fn multi_token_characters_keep_the_overlap_or_fail() {
        let chunker = TokenChunker::new(8, 6).unwrap();
        let page = Page::new(2, "🍳🥐🍝🔥🧑‍🍳".repeat(6));

        match chunker.chunk(&page) {
            Ok(chunks) => {
                for pair in chunks.windows(2) {
                    assert!(pair[0].token_end - pair[1].token_start >= 6);
                }
            }
            Err(err) => {
                assert!(matches!(err, RagError::SplitError(_)));
                assert!(err.to_string().contains("cannot share 6 tokens"), "{err}");
            }
        }
    }
}
