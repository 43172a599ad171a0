//! Chat model trait for answer generation.

use async_trait::async_trait;

use crate::error::Result;
use crate::prompt::PromptMessage;

/// A hosted chat-completion model.
///
/// Implementations send the whole prompt in one request and return the
/// complete text of the first choice. A completion without content is
/// returned as an empty string rather than an error.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given messages.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;

    /// Model identifier used in logs and error messages.
    fn name(&self) -> &str;
}
