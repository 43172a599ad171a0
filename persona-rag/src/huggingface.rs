//! Hugging Face embedding provider using the hosted Inference API.
//!
//! This module is only available when the `huggingface` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "HuggingFace";

/// The default Inference API base URL.
pub const HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";

/// The default sentence-transformers model.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// The dimensionality of `all-MiniLM-L6-v2`.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] backed by the Hugging Face feature-extraction pipeline.
///
/// # Configuration
///
/// - `model` – defaults to `sentence-transformers/all-MiniLM-L6-v2`.
/// - `dimensions` – must match the model; defaults to 384.
/// - `api_token` – from the constructor or the `HF_TOKEN` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use persona_rag::huggingface::HuggingFaceEmbeddingProvider;
///
/// let provider = HuggingFaceEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct HuggingFaceEmbeddingProvider {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl HuggingFaceEmbeddingProvider {
    /// Create a new provider with the given API token.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(RagError::embed(PROVIDER, "API token must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_token,
            base_url: HF_INFERENCE_URL.into(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new provider using the `HF_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("HF_TOKEN")
            .map_err(|_| RagError::embed(PROVIDER, "HF_TOKEN environment variable not set"))?;
        Self::new(api_token)
    }

    /// Set the model repository id and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Point the provider at a different Inference API deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}/pipeline/feature-extraction", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [&'a str],
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::embed(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(&FeatureExtractionRequest { inputs: texts })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::embed(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embed(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let embeddings: Vec<Vec<f32>> = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embed(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        if embeddings.len() != texts.len() {
            return Err(RagError::embed(
                PROVIDER,
                format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
            ));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(RagError::embed(
                PROVIDER,
                format!("expected {} dimensions, got {}", self.dimensions, bad.len()),
            ));
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
