use domain::error::RagError;
use domain::models::EmptyContextPolicy;
use domain::ports::DecodingParams;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_COLLECTION: &str = "qa_rag_data_science";

#[derive(Debug, Clone)]
pub struct Config {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub qdrant_collection: String,
    pub qdrant_timeout: Duration,
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub embedding_dim: Option<usize>,
    pub embedding_timeout: Duration,
    pub generation_model: String,
    pub generation_timeout: Duration,
    pub generation_concurrency: usize,
    pub top_k: usize,
    pub relevance_threshold: f32,
    pub empty_context: EmptyContextPolicy,
    pub decoding: DecodingParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
            qdrant_collection: DEFAULT_COLLECTION.to_string(),
            qdrant_timeout: Duration::from_secs(60),
            ollama_base_url: "http://localhost:11434".to_string(),
            embedding_model: "multilingual-e5-large".to_string(),
            embedding_dim: None,
            embedding_timeout: Duration::from_secs(60),
            generation_model: "qwen2.5:1.5b-instruct".to_string(),
            generation_timeout: Duration::from_secs(300),
            generation_concurrency: 1,
            top_k: 3,
            relevance_threshold: 0.35,
            empty_context: EmptyContextPolicy::Generate,
            decoding: DecodingParams::default(),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, RagError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let config = Self {
            qdrant_url: text("QDRANT_URL", defaults.qdrant_url),
            qdrant_api_key: lookup("QDRANT_API_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            qdrant_collection: text("QDRANT_COLLECTION", defaults.qdrant_collection),
            qdrant_timeout: Duration::from_secs(parse_or(
                &lookup,
                "QDRANT_TIMEOUT_SECS",
                defaults.qdrant_timeout.as_secs(),
            )?),
            ollama_base_url: text("OLLAMA_BASE_URL", defaults.ollama_base_url),
            embedding_model: text("EMBEDDING_MODEL", defaults.embedding_model),
            embedding_dim: parse_opt(&lookup, "EMBEDDING_DIM")?,
            embedding_timeout: Duration::from_secs(parse_or(
                &lookup,
                "EMBEDDING_TIMEOUT_SECS",
                defaults.embedding_timeout.as_secs(),
            )?),
            generation_model: text("GENERATION_MODEL", defaults.generation_model),
            generation_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            generation_concurrency: parse_or(
                &lookup,
                "GENERATION_CONCURRENCY",
                defaults.generation_concurrency,
            )?,
            top_k: parse_or(&lookup, "RAG_TOP_K", defaults.top_k)?,
            relevance_threshold: parse_or(
                &lookup,
                "RAG_RELEVANCE_THRESHOLD",
                defaults.relevance_threshold,
            )?,
            empty_context: parse_or(&lookup, "RAG_EMPTY_CONTEXT_POLICY", defaults.empty_context)?,
            decoding: DecodingParams {
                max_new_tokens: parse_or(
                    &lookup,
                    "GEN_MAX_NEW_TOKENS",
                    defaults.decoding.max_new_tokens,
                )?,
                do_sample: parse_or(&lookup, "GEN_DO_SAMPLE", defaults.decoding.do_sample)?,
                temperature: parse_or(&lookup, "GEN_TEMPERATURE", defaults.decoding.temperature)?,
                top_p: parse_or(&lookup, "GEN_TOP_P", defaults.decoding.top_p)?,
                repetition_penalty: parse_or(
                    &lookup,
                    "GEN_REPETITION_PENALTY",
                    defaults.decoding.repetition_penalty,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(RagError::Config(format!(
                "RAG_RELEVANCE_THRESHOLD must be within [0, 1], got {}",
                self.relevance_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("RAG_TOP_K must be at least 1".into()));
        }
        if self.generation_concurrency == 0 {
            return Err(RagError::Config(
                "GENERATION_CONCURRENCY must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.decoding.top_p) {
            return Err(RagError::Config(format!(
                "GEN_TOP_P must be within [0, 1], got {}",
                self.decoding.top_p
            )));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, RagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>, RagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| RagError::Config(format!("{key}={v}: {e}"))),
    }
}
