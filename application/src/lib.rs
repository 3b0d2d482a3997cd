pub mod generation;
pub mod rag_service;
pub mod resources;
pub mod retriever;
