//! Build-once, read-many in-memory embedding index.
//!
//! [`EmbeddingIndex`] embeds every chunk exactly once when it is built and is
//! immutable afterwards, so it can be shared across request handlers behind an
//! `Arc` without any locking.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// A chunk together with its embedding vector.
#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An in-memory vector index using cosine similarity for search.
///
/// The provider used to build the index is kept and reused for queries.
///
/// # Example
///
/// ```rust,ignore
/// use persona_rag::EmbeddingIndex;
///
/// let index = EmbeddingIndex::build(provider, chunks).await?;
/// let results = index.query("What is your profession?", 1).await?;
/// ```
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexedChunk>,
}

impl fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("provider", &self.provider.name())
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl EmbeddingIndex {
    /// Embed all chunks with `provider` and store them.
    ///
    /// The whole build fails if any embedding fails; there are no partial
    /// indexes. Building from an empty chunk list yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbedError`] if the provider fails, returns a
    /// different number of vectors than chunks, or returns a vector whose
    /// length differs from [`EmbeddingProvider::dimensions`].
    pub async fn build(provider: Arc<dyn EmbeddingProvider>, chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self { provider, entries: Vec::new() });
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts).await.map_err(|e| {
            error!(provider = provider.name(), error = %e, "embedding failed during index build");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::embed(
                provider.name(),
                format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            ));
        }

        let dimensions = provider.dimensions();
        if let Some((i, bad)) = embeddings.iter().enumerate().find(|(_, v)| v.len() != dimensions) {
            return Err(RagError::embed(
                provider.name(),
                format!(
                    "embedding for chunk '{}' has {} dimensions, expected {dimensions}",
                    chunks[i].id,
                    bad.len()
                ),
            ));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        info!(provider = provider.name(), chunk_count = entries.len(), "built embedding index");

        Ok(Self { provider, entries })
    }

    /// Number of chunks stored in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the stored chunks in build order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Embed `query` and return the `top_k` most similar chunks.
    ///
    /// Returns an empty result without calling the provider if the index is empty.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbedError`] if the query embedding fails or has a
    /// different length than the stored vectors.
    pub async fn query(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.provider.embed(query).await.map_err(|e| {
            error!(provider = self.provider.name(), error = %e, "embedding failed during query");
            e
        })?;

        let dimensions = self.provider.dimensions();
        if query_embedding.len() != dimensions {
            return Err(RagError::embed(
                self.provider.name(),
                format!(
                    "query embedding has {} dimensions, expected {dimensions}",
                    query_embedding.len()
                ),
            ));
        }

        Ok(self.search(&query_embedding, top_k))
    }

    /// Return the `top_k` chunks most similar to `embedding`, best first.
    ///
    /// Equal scores keep build order.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        debug!(result_count = scored.len(), top_k, "searched index");
        scored
    }
}
