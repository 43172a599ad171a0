//! Tests for the build-once embedding index.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use common::{FailingEmbedder, TopicEmbedder};
use persona_rag::{Chunk, EmbeddingIndex, EmbeddingProvider, RagError};
use proptest::prelude::*;

fn chunk(n: usize, text: &str) -> Chunk {
    Chunk {
        id: format!("page-1-chunk-{n}"),
        text: text.to_string(),
        page_number: 1,
        token_start: n * 10,
        token_end: n * 10 + 12,
    }
}

/// Returns a fixed vector for each text, looked up by exact match.
struct TableEmbedder {
    table: Vec<(String, Vec<f32>)>,
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> persona_rag::Result<Vec<f32>> {
        self.table
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RagError::embed("table", format!("unknown text '{text}'")))
    }

    fn dimensions(&self) -> usize {
        self.table.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let table: Vec<(String, Vec<f32>)> = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, v)| (format!("chunk {i}"), v))
                .collect();
            let chunks: Vec<Chunk> = table.iter().enumerate().map(|(i, (t, _))| chunk(i, t)).collect();
            let count = chunks.len();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let index = rt
                .block_on(EmbeddingIndex::build(Arc::new(TableEmbedder { table }), chunks))
                .unwrap();
            let results = index.search(&query, top_k);

            prop_assert_eq!(results.len(), top_k.min(count));
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

#[tokio::test]
async fn query_returns_the_most_similar_chunk() {
    let chunks = vec![
        chunk(0, "On weekends I go hiking in the mountains."),
        chunk(1, "My name is Alex and I am a chef."),
        chunk(2, "My sister lives in Lisbon."),
    ];
    let index = EmbeddingIndex::build(Arc::new(TopicEmbedder::default()), chunks).await.unwrap();

    let results = index.query("What is your profession?", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.text, "My name is Alex and I am a chef.");
    assert!(results[0].score > 0.0);
}

#[tokio::test]
async fn equal_scores_keep_build_order() {
    let chunks = vec![chunk(0, "first"), chunk(1, "second"), chunk(2, "third")];
    let index = EmbeddingIndex::build(Arc::new(TopicEmbedder::default()), chunks).await.unwrap();

    // No topic words anywhere: every score is zero.
    let results = index.search(&[0.0, 0.0, 0.0, 0.0], 3);
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, ["page-1-chunk-0", "page-1-chunk-1", "page-1-chunk-2"]);
}

#[tokio::test]
async fn empty_index_answers_without_embedding() {
    let embedder = Arc::new(TopicEmbedder::default());
    let index = EmbeddingIndex::build(embedder.clone(), Vec::new()).await.unwrap();

    assert!(index.is_empty());
    assert!(index.query("anything", 1).await.unwrap().is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn build_fails_when_any_embedding_fails() {
    let chunks = vec![chunk(0, "a"), chunk(1, "b")];
    let err = EmbeddingIndex::build(Arc::new(FailingEmbedder), chunks).await.unwrap_err();

    assert!(matches!(err, RagError::EmbedError { .. }));
    assert!(err.to_string().contains("service unavailable"));
}

#[tokio::test]
async fn chunks_are_embedded_once_at_build() {
    let embedder = Arc::new(TopicEmbedder::default());
    let chunks = vec![chunk(0, "chef"), chunk(1, "hiking")];
    let index = EmbeddingIndex::build(embedder.clone(), chunks).await.unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);

    index.query("job", 1).await.unwrap();
    index.query("weekend", 1).await.unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn build_rejects_vectors_of_the_wrong_length() {
    let table = vec![
        ("chef".to_string(), vec![1.0, 0.0, 0.0]),
        ("hiking".to_string(), vec![0.0, 1.0]),
    ];
    let chunks = vec![chunk(0, "chef"), chunk(1, "hiking")];

    let err = EmbeddingIndex::build(Arc::new(TableEmbedder { table }), chunks)
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::EmbedError { .. }));
    assert!(err.to_string().contains("page-1-chunk-1"), "{err}");
}

#[tokio::test]
async fn query_rejects_a_vector_of_the_wrong_length() {
    let table = vec![
        ("chef".to_string(), vec![1.0, 0.0, 0.0]),
        ("hiking".to_string(), vec![0.0, 1.0, 0.0]),
        ("q".to_string(), vec![1.0]),
    ];
    let chunks = vec![chunk(0, "chef"), chunk(1, "hiking")];
    let index = EmbeddingIndex::build(Arc::new(TableEmbedder { table }), chunks).await.unwrap();

    let err = index.query("q", 1).await.unwrap_err();

    assert!(matches!(err, RagError::EmbedError { .. }));
    assert!(err.to_string().contains("1 dimensions, expected 3"), "{err}");
}
