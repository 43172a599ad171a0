//! Persona prompt template.

use serde::{Deserialize, Serialize};

/// Instruction that makes the model answer as the character described by the document.
pub const PERSONA_INSTRUCTION: &str = "You are now roleplaying as a character whose profile is given below. \
Respond to all questions as if you are that person. \
Speak naturally and in the first person with a human-like tone. \
Always stay in character and never refer to yourself as an AI. \
If you don't know the answer, respond in a believable way based on your personality.";

/// Author of a prompt message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and retrieved context.
    System,
    /// The person asking the question. Sent as `user` on OpenAI-style APIs.
    #[serde(rename = "user")]
    Human,
}

/// A single role-tagged message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptMessage {
    /// Who the message is from.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl PromptMessage {
    /// Create a [`Role::System`] message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Create a [`Role::Human`] message.
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }
}

/// Build the persona prompt for one question.
///
/// Produces, in order: the persona instruction, a system message carrying the
/// retrieved context, and the question as a human message.
pub fn persona_messages(context: &str, question: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(PERSONA_INSTRUCTION),
        PromptMessage::system(format!("Context: {context}")),
        PromptMessage::human(question),
    ]
}
