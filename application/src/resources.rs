use crate::rag_service::RagService;
use anyhow::Context;
use domain::error::RagError;
use infrastructure::config::Config;
use infrastructure::embedder::Embedder;
use infrastructure::ollama_client::OllamaClient;
use infrastructure::qdrant_client::{CollectionInfo, QdrantClient};
use shared::types::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub type QdrantRagService = RagService<Embedder, QdrantClient, OllamaClient>;

/// Process-wide clients, built once at startup and shared by every request.
pub struct RagResources {
    config: Config,
    collection: CollectionInfo,
    service: Arc<QdrantRagService>,
    shutdown: CancellationToken,
}

impl RagResources {
    /// Build the clients and verify the collection before serving anything,
    /// so a bad endpoint, credential or collection name fails here.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            url = %config.qdrant_url,
            collection = %config.qdrant_collection,
            "connecting to vector store"
        );
        let qdrant = QdrantClient::from_config(&config)?;
        let collection = qdrant.get_collection().await.with_context(|| {
            format!(
                "cannot reach collection '{}' at {}",
                config.qdrant_collection, config.qdrant_url
            )
        })?;
        check_dimension(&config, &collection)?;
        info!(
            status = ?collection.status,
            points = ?collection.points_count,
            vector_size = ?collection.vector_size,
            "vector store ready"
        );

        let ollama = OllamaClient::from_config(&config);
        info!(
            embedding_model = %config.embedding_model,
            generation_model = %ollama.generation_model(),
            "language models configured"
        );

        let shutdown = CancellationToken::new();
        let encoder = Embedder::new(ollama.clone());
        let service = RagService::from_config(&config, encoder, qdrant, ollama)
            .with_shutdown_token(shutdown.clone());

        Ok(Self {
            config,
            collection,
            service: Arc::new(service),
            shutdown,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn collection(&self) -> &CollectionInfo {
        &self.collection
    }

    pub fn service(&self) -> Arc<QdrantRagService> {
        Arc::clone(&self.service)
    }

    /// Token cancelled by `shutdown`; hand it to anything that should stop with us.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(self) {
        info!("shutting down RAG resources");
        self.service.shutdown();
    }
}

fn check_dimension(
    config: &Config,
    collection: &CollectionInfo,
) -> std::result::Result<(), RagError> {
    match (collection.vector_size, config.embedding_dim) {
        (Some(expected), Some(actual)) if expected != actual => {
            Err(RagError::DimensionMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}
