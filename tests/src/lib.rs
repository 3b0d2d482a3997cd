//! Instrumented collaborators shared by the scenario tests.

mod memory_store;

pub use memory_store::InMemoryStore;

use domain::models::{EmbeddingVector, Payload, Prompt, RetrievedPassage};
use domain::ports::{DecodingParams, QueryEncoder, TextGenerator, VectorStore};
use serde_json::Value;
use shared::types::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("payload must be a JSON object, got {other}"),
    }
}

pub fn passage(score: f32, value: Value) -> RetrievedPassage {
    RetrievedPassage::new(score, payload(value))
}

/// Records every question it encodes.
#[derive(Default)]
pub struct StubEncoder {
    pub queries: Mutex<Vec<String>>,
}

impl QueryEncoder for StubEncoder {
    async fn encode_query(&self, text: &str) -> Result<EmbeddingVector> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(EmbeddingVector(vec![0.1; 4]))
    }
}

pub enum StoreBehavior {
    Returns(Vec<RetrievedPassage>),
    Fails(String),
}

pub struct StubStore {
    behavior: StoreBehavior,
    pub calls: AtomicUsize,
}

impl StubStore {
    pub fn returning(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            behavior: StoreBehavior::Returns(passages),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            behavior: StoreBehavior::Fails(detail.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl VectorStore for StubStore {
    async fn search(&self, _vector: &EmbeddingVector, limit: usize) -> Result<Vec<RetrievedPassage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            StoreBehavior::Returns(passages) => Ok(passages.iter().take(limit).cloned().collect()),
            StoreBehavior::Fails(detail) => Err(anyhow::anyhow!("{detail}")),
        }
    }
}

/// Counts invocations and keeps every prompt it was handed.
pub struct StubGenerator {
    reply: std::result::Result<String, String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            reply: Err(detail.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &Prompt, _params: &DecodingParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        self.reply.clone().map_err(|detail| anyhow::anyhow!(detail))
    }
}
