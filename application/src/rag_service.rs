use crate::generation::GenerationEngine;
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use domain::context::PayloadExtractor;
use domain::error::RagError;
use domain::models::{Answer, EmptyContextPolicy, RetrievalResult};
use domain::ports::{QueryEncoder, TextGenerator, VectorStore};
use domain::prompt::PromptTemplate;
use infrastructure::config::Config;
use shared::telemetry::Telemetry;
use shared::utils::preview;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Entry point for callers: a question goes in, an answer string comes out.
/// Retrieval and generation failures are folded into the answer text.
pub struct RagService<E, S, G> {
    retriever: Retriever<E, S>,
    extractor: PayloadExtractor,
    template: PromptTemplate,
    engine: GenerationEngine<G>,
    empty_context: EmptyContextPolicy,
    top_k: usize,
    shutdown: CancellationToken,
}

impl<E, S, G> RagService<E, S, G>
where
    E: QueryEncoder,
    S: VectorStore,
    G: TextGenerator,
{
    pub fn new(retriever: Retriever<E, S>, engine: GenerationEngine<G>) -> Self {
        Self {
            retriever,
            extractor: PayloadExtractor::default(),
            template: PromptTemplate::default(),
            engine,
            empty_context: EmptyContextPolicy::default(),
            top_k: DEFAULT_TOP_K,
            shutdown: CancellationToken::new(),
        }
    }

    /// Wire collaborators with every tunable taken from `config`.
    pub fn from_config(config: &Config, encoder: E, store: S, generator: G) -> Self {
        let retriever = Retriever::new(encoder, store)
            .with_threshold(config.relevance_threshold)
            .with_encode_timeout(config.embedding_timeout)
            .with_timeout(config.qdrant_timeout);
        let engine = GenerationEngine::new(generator)
            .with_params(config.decoding.clone())
            .with_concurrency(config.generation_concurrency)
            .with_timeout(config.generation_timeout);
        Self::new(retriever, engine)
            .with_top_k(config.top_k)
            .with_empty_context_policy(config.empty_context)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_empty_context_policy(mut self, policy: EmptyContextPolicy) -> Self {
        self.empty_context = policy;
        self
    }

    /// Requests run under child tokens of `token`; cancelling it ends them.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn generate_answer(&self, query: &str) -> String {
        let cancel = self.shutdown.child_token();
        self.answer(query, &cancel).await.into_text()
    }

    pub async fn answer(&self, query: &str, cancel: &CancellationToken) -> Answer {
        let telemetry = Telemetry::new();
        info!(query = %preview(query, 80), "answering question");

        let passages = match self.retriever.retrieve(query, self.top_k, cancel).await {
            RetrievalResult::Found(passages) => passages,
            RetrievalResult::NoneFound(reason) => {
                info!(
                    ?reason,
                    cause = %RagError::from(reason.clone()),
                    elapsed_ms = telemetry.elapsed_ms(),
                    "refusing"
                );
                return Answer::Refused;
            }
        };

        let context = self.extractor.build_context(&passages);
        if context.is_empty() {
            warn!(
                passages = passages.len(),
                policy = ?self.empty_context,
                "retrieved passages carry no known text field"
            );
            if self.empty_context == EmptyContextPolicy::Refuse {
                info!(cause = %RagError::NoRelevantContext, "refusing");
                return Answer::Refused;
            }
        }

        let prompt = self.template.render(&context, query);
        match self.engine.generate(&prompt, cancel).await {
            Ok(text) => {
                info!(
                    passages = passages.len(),
                    elapsed_ms = telemetry.elapsed_ms(),
                    "answer generated"
                );
                Answer::Generated(text)
            }
            Err(err) => {
                warn!(error = %err, elapsed_ms = telemetry.elapsed_ms(), "generation failed");
                Answer::GenerationFailed(err.to_string())
            }
        }
    }

    /// Cancel in-flight requests and stop accepting generations.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.engine.close();
    }
}
