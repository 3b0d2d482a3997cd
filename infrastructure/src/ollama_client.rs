use crate::config::Config;
use crate::error::ClientError;
use domain::models::Prompt;
use domain::ports::{DecodingParams, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;

const SERVICE: &str = "ollama";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize, Debug, PartialEq)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
}

impl From<&DecodingParams> for GenerateOptions {
    fn from(params: &DecodingParams) -> Self {
        Self {
            num_predict: params.max_new_tokens,
            // Ollama has no sampling switch; temperature 0 is greedy decoding.
            temperature: if params.do_sample { params.temperature } else { 0.0 },
            top_p: params.top_p,
            repeat_penalty: params.repetition_penalty,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    /// The prompt is already templated; Ollama must not wrap it again.
    raw: bool,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Arc<Client>,
    base_url: String,
    embedding_model: String,
    generation_model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        embedding_model: impl Into<String>,
        generation_model: impl Into<String>,
    ) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embedding_model: embedding_model.into(),
            generation_model: generation_model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.ollama_base_url,
            &config.embedding_model,
            &config.generation_model,
        )
    }

    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    /// Embed `text` exactly as given; callers own any mode prefix.
    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::http(&url, e))?;
        let response = check_status(response).await?;
        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        if embedding_response.embedding.is_empty() {
            return Err(ClientError::Decode {
                service: SERVICE,
                detail: format!("empty embedding from model '{}'", self.embedding_model),
            }
            .into());
        }
        Ok(embedding_response.embedding)
    }

    /// Continue a pre-templated prompt and return only the new text.
    pub async fn generate_raw(&self, prompt: &str, params: &DecodingParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.generation_model,
            prompt,
            raw: true,
            stream: false,
            options: GenerateOptions::from(params),
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::http(&url, e))?;
        let response = check_status(response).await?;
        let generated: GenerateResponse =
            response.json().await.map_err(|e| ClientError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        Ok(generated.response)
    }
}

impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &Prompt, params: &DecodingParams) -> Result<String> {
        self.generate_raw(prompt.as_str(), params).await
    }
}

async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service: SERVICE,
        status,
        body,
    })
}
