//! Error types for the `persona-rag` crate.

use thiserror::Error;

/// Errors that can occur while building the index or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document could not be read or is not a valid PDF.
    #[error("Error loading document '{path}': {message}")]
    LoadError {
        /// Path of the document that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The source document was readable but yielded no text to index.
    #[error("No text found in document '{0}'")]
    EmptyDocument(String),

    /// Tokenization failed while splitting pages into chunks.
    #[error("Error splitting document: {0}")]
    SplitError(String),

    /// An error occurred during embedding generation.
    #[error("Error embedding text ({provider}): {message}")]
    EmbedError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat model call failed.
    #[error("Error generating response ({provider}): {message}")]
    GenerationError {
        /// The chat model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Shorthand for an [`RagError::EmbedError`].
    pub fn embed(provider: &str, message: impl Into<String>) -> Self {
        Self::EmbedError { provider: provider.to_string(), message: message.into() }
    }

    /// Shorthand for a [`RagError::GenerationError`].
    pub fn generation(provider: &str, message: impl Into<String>) -> Self {
        Self::GenerationError { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
