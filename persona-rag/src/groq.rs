//! Groq chat model using the OpenAI-compatible chat completions API.
//!
//! This module is only available when the `groq` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GenerationConfig;
use crate::error::{RagError, Result};
use crate::generation::ChatModel;
use crate::prompt::PromptMessage;

const PROVIDER: &str = "Groq";

/// The default Groq OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default Groq model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// A [`ChatModel`] backed by Groq's `/chat/completions` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use persona_rag::groq::GroqChatModel;
///
/// let model = GroqChatModel::from_env()?;
/// let answer = model.complete(&messages).await?;
/// ```
pub struct GroqChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    generation: GenerationConfig,
}

impl GroqChatModel {
    /// Create a new model client with the given API key.
    ///
    /// Uses `llama-3.3-70b-versatile`, temperature 0.1 and 256 max tokens.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::generation(PROVIDER, "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GROQ_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            generation: GenerationConfig::default(),
        })
    }

    /// Create a new model client using the `GROQ_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| RagError::generation(PROVIDER, "GROQ_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override temperature and max tokens.
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Point the client at another OpenAI-compatible deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&'a self, messages: &'a [PromptMessage]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            stream: false,
        }
    }
}

// ── Chat completions request/response types ───────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ChatCompletionResponse {
    fn into_text(self) -> String {
        self.choices.into_iter().next().and_then(|c| c.message.content).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for GroqChatModel {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, message_count = messages.len(), "requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request(messages))
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::generation(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::generation(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::generation(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(completion.into_text())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
