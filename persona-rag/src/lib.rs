//! `persona-rag` answers questions in the voice of a character described by a
//! single PDF. The document is loaded, cut into token windows and embedded once;
//! each question then retrieves the closest window and is sent to a chat model
//! together with a persona prompt.
//!
//! Providers are selected by features:
//!
//! - `huggingface` (default): [`huggingface::HuggingFaceEmbeddingProvider`]
//! - `groq` (default): [`groq::GroqChatModel`]

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod prompt;

#[cfg(feature = "groq")]
pub mod groq;
#[cfg(feature = "huggingface")]
pub mod huggingface;

pub use chunking::{Chunker, TokenChunker};
pub use config::{GenerationConfig, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Page, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::ChatModel;
pub use index::EmbeddingIndex;
pub use loader::load_pdf;
pub use pipeline::{Answer, PersonaPipeline, PersonaPipelineBuilder};
pub use prompt::{PERSONA_INSTRUCTION, PromptMessage, Role, persona_messages};
