use crate::config::Config;
use crate::error::ClientError;
use domain::models::{EmbeddingVector, RetrievedPassage};
use domain::ports::VectorStore;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "qdrant";

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<RetrievedPassage>,
}

#[derive(Deserialize)]
struct CollectionResult {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    points_count: Option<u64>,
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    #[serde(default)]
    vectors: Value,
}

/// What the startup check learns about the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub status: Option<String>,
    pub points_count: Option<u64>,
    /// Size of the unnamed default vector; `None` for named-vector collections.
    pub vector_size: Option<usize>,
}

/// Thin client for Qdrant's REST API.
#[derive(Clone)]
pub struct QdrantClient {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            collection: collection.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            config.qdrant_api_key.clone(),
            &config.qdrant_collection,
            config.qdrant_timeout,
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn get_collection(&self) -> Result<CollectionInfo> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let result: CollectionResult = self.send(&url, self.client.get(&url)).await?;
        Ok(CollectionInfo {
            status: result.status,
            points_count: result.points_count,
            vector_size: result
                .config
                .params
                .vectors
                .get("size")
                .and_then(Value::as_u64)
                .map(|size| size as usize),
        })
    }

    pub async fn query_points(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.base_url, self.collection
        );
        let request = QueryRequest {
            query: vector,
            limit,
            with_payload: true,
        };
        let result: QueryResult = self
            .send(&url, self.client.post(&url).json(&request))
            .await?;
        debug!(
            collection = %self.collection,
            hits = result.points.len(),
            "qdrant query complete"
        );
        Ok(result.points)
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T> {
        let request = match &self.api_key {
            Some(key) => request.header("api-key", key.as_str()),
            None => request,
        };
        let response = request.send().await.map_err(|e| ClientError::http(url, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                service: SERVICE,
                status,
                body,
            }
            .into());
        }
        let envelope: Envelope<T> = response.json().await.map_err(|e| ClientError::Decode {
            service: SERVICE,
            detail: e.to_string(),
        })?;
        Ok(envelope.result)
    }
}

impl VectorStore for QdrantClient {
    async fn search(&self, vector: &EmbeddingVector, limit: usize) -> Result<Vec<RetrievedPassage>> {
        self.query_points(vector.as_slice(), limit).await
    }
}
