//! Deterministic stand-ins for the hosted embedding and chat models.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use persona_rag::{ChatModel, EmbeddingProvider, PromptMessage, RagError, Result};

/// Words that share a dimension are treated as semantically close.
const TOPICS: &[&[&str]] = &[
    &["profession", "job", "work", "chef", "cook", "kitchen", "bistro"],
    &["hobby", "hobbies", "weekend", "weekends", "hiking", "mountains"],
    &["family", "sister", "brother", "parents", "lisbon"],
    &["name", "called", "alex"],
];

/// Embeds text as topic counts so that related words land close together.
#[derive(Debug, Default)]
pub struct TopicEmbedder {
    pub calls: AtomicUsize,
}

impl TopicEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; TOPICS.len()];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            for (dim, topic) in TOPICS.iter().enumerate() {
                if topic.contains(&word.as_str()) {
                    vector[dim] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        TOPICS.len()
    }

    fn name(&self) -> &str {
        "topic"
    }
}

/// Fails every embedding request.
#[derive(Debug, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::embed("failing", "service unavailable"))
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Returns a canned reply and records the prompts it was given.
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    pub reply: String,
    pub prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedChatModel {
    pub fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Fails every completion request.
#[derive(Debug, Default)]
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _messages: &[PromptMessage]) -> Result<String> {
        Err(RagError::generation("failing", "rate limited"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Write a PDF with one page per entry of `pages` to `path`.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
