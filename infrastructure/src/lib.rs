pub mod config;
pub mod embedder;
pub mod error;
pub mod ollama_client;
pub mod qdrant_client;
