use super::ollama_client::OllamaClient;
use domain::models::{EmbeddingMode, EmbeddingVector};
use domain::ports::QueryEncoder;
use shared::types::Result;

/// Multilingual e5 encoder served by Ollama. Applies the mode prefix the
/// model was trained with before every call.
#[derive(Clone)]
pub struct Embedder {
    client: OllamaClient,
}

impl Embedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    pub async fn encode(&self, text: &str, mode: EmbeddingMode) -> Result<EmbeddingVector> {
        let vector = self.client.generate_embedding(&mode.apply(text)).await?;
        Ok(EmbeddingVector(vector))
    }
}

impl QueryEncoder for Embedder {
    async fn encode_query(&self, text: &str) -> Result<EmbeddingVector> {
        self.encode(text, EmbeddingMode::Query).await
    }
}
