use crate::models::{EmbeddingVector, Prompt, RetrievedPassage};
use shared::types::Result;
use std::future::Future;
use std::sync::Arc;

/// Turns question text into a vector in query mode.
pub trait QueryEncoder: Send + Sync {
    fn encode_query(&self, text: &str) -> impl Future<Output = Result<EmbeddingVector>> + Send;
}

/// Nearest-neighbour search over an already indexed collection.
pub trait VectorStore: Send + Sync {
    fn search(
        &self,
        vector: &EmbeddingVector,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedPassage>>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodingParams {
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            do_sample: true,
            temperature: 0.1,
            top_p: 0.9,
            repetition_penalty: 1.1,
        }
    }
}

/// Continues a fully rendered prompt. Implementations return only the new
/// text, never the echoed prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &Prompt,
        params: &DecodingParams,
    ) -> impl Future<Output = Result<String>> + Send;
}

impl<T: QueryEncoder> QueryEncoder for Arc<T> {
    fn encode_query(&self, text: &str) -> impl Future<Output = Result<EmbeddingVector>> + Send {
        (**self).encode_query(text)
    }
}

impl<T: VectorStore> VectorStore for Arc<T> {
    fn search(
        &self,
        vector: &EmbeddingVector,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedPassage>>> + Send {
        (**self).search(vector, limit)
    }
}

impl<T: TextGenerator> TextGenerator for Arc<T> {
    fn generate(
        &self,
        prompt: &Prompt,
        params: &DecodingParams,
    ) -> impl Future<Output = Result<String>> + Send {
        (**self).generate(prompt, params)
    }
}
