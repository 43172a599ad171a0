//! Persona RAG pipeline.
//!
//! The [`PersonaPipeline`] is the application context: it is built once at
//! startup (load → chunk → embed → index) and then answers questions
//! (retrieve → prompt → generate) for the lifetime of the process.
//!
//! # Example
//!
//! ```rust,ignore
//! use persona_rag::{PersonaPipeline, RagConfig};
//!
//! let pipeline = PersonaPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .chat_model(Arc::new(model))
//!     .build_from_pdf("profile.pdf")
//!     .await?;
//!
//! let answer = pipeline.answer("What is your profession?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, TokenChunker};
use crate::config::RagConfig;
use crate::document::{Page, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::ChatModel;
use crate::index::EmbeddingIndex;
use crate::loader::load_pdf;
use crate::prompt::persona_messages;

/// A generated answer together with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Generated text. May be empty if the model produced no content.
    pub text: String,
    /// Retrieved chunks, best first.
    pub context: Vec<SearchResult>,
}

/// The build-once question answering pipeline.
pub struct PersonaPipeline {
    config: RagConfig,
    index: EmbeddingIndex,
    chat_model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for PersonaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonaPipeline")
            .field("config", &self.config)
            .field("index", &self.index)
            .field("chat_model", &self.chat_model.name())
            .finish()
    }
}

impl PersonaPipeline {
    /// Create a new [`PersonaPipelineBuilder`].
    pub fn builder() -> PersonaPipelineBuilder {
        PersonaPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding index.
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Retrieve the `top_k` chunks most relevant to `question`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbedError`] if the question cannot be embedded.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.index.query(question, self.config.top_k).await
    }

    /// Answer `question` in the persona's voice.
    ///
    /// Retrieves context once, builds the persona prompt and asks the chat
    /// model. An empty retrieval result produces an empty context.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbedError`] if retrieval fails and
    /// [`RagError::GenerationError`] if the chat model fails.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let context = self.retrieve(question).await?;

        let context_text =
            context.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let messages = persona_messages(&context_text, question);

        let text = self.chat_model.complete(&messages).await.map_err(|e| {
            error!(model = self.chat_model.name(), error = %e, "generation failed");
            e
        })?;

        info!(
            context_chunks = context.len(),
            answer_len = text.len(),
            "answered question"
        );

        Ok(Answer { text, context })
    }
}

/// Builder for constructing a [`PersonaPipeline`].
///
/// `embedding_provider` and `chat_model` are required. Without an explicit
/// chunker a [`TokenChunker`] is created from the configuration.
#[derive(Default)]
pub struct PersonaPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl PersonaPipelineBuilder {
    /// Set the pipeline configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for both chunks and questions.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the chat model used for answers.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Load the PDF at `path` and build the pipeline from its pages.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] or [`RagError::EmptyDocument`] if the
    /// document cannot be used, plus every error of
    /// [`build_from_pages`](Self::build_from_pages).
    pub async fn build_from_pdf(self, path: impl AsRef<Path>) -> Result<PersonaPipeline> {
        let path = path.as_ref();
        let pages = load_pdf(path)?;
        self.build_from_pages(&path.display().to_string(), &pages).await
    }

    /// Chunk and index already extracted pages.
    ///
    /// `source` names the document in errors and logs.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if a required component is missing or the
    ///   configuration is invalid.
    /// - [`RagError::SplitError`] if chunking fails.
    /// - [`RagError::EmptyDocument`] if the pages produce no chunks.
    /// - [`RagError::EmbedError`] if any chunk cannot be embedded.
    pub async fn build_from_pages(self, source: &str, pages: &[Page]) -> Result<PersonaPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::ConfigError("chat_model is required".to_string()))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(TokenChunker::from_config(&config)?),
        };

        let chunks = chunker.chunk_pages(pages)?;
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument(source.to_string()));
        }

        let index = EmbeddingIndex::build(embedding_provider, chunks).await?;
        info!(source, chunk_count = index.len(), top_k = config.top_k, "pipeline ready");

        Ok(PersonaPipeline { config, index, chat_model })
    }
}
