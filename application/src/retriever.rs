use anyhow::{anyhow, Context};
use domain::models::{NoneFoundReason, RetrievalResult, RetrievedPassage};
use domain::ports::{QueryEncoder, VectorStore};
use shared::types::Result;
use shared::utils::preview;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.35;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Retriever<E, S> {
    encoder: E,
    store: S,
    threshold: f32,
    encode_timeout: Duration,
    search_timeout: Duration,
}

impl<E: QueryEncoder, S: VectorStore> Retriever<E, S> {
    pub fn new(encoder: E, store: S) -> Self {
        Self {
            encoder,
            store,
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
            encode_timeout: DEFAULT_ENCODE_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Candidates must score strictly above this to be used.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Upper bound on the vector search alone.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// Upper bound on query encoding alone.
    pub fn with_encode_timeout(mut self, timeout: Duration) -> Self {
        self.encode_timeout = timeout;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Never fails: an unreachable store, a timeout or a cancellation all
    /// come back as `NoneFound`.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> RetrievalResult {
        let top_k = top_k.max(1);
        match self.search(query, top_k, cancel).await {
            Ok(candidates) => {
                let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
                let result = RetrievalResult::from_candidates(candidates, self.threshold, top_k);
                debug!(
                    query = %preview(query, 80),
                    ?scores,
                    threshold = self.threshold,
                    found = result.is_found(),
                    "retrieval finished"
                );
                result
            }
            Err(err) => {
                let detail = format!("{err:#}");
                warn!(query = %preview(query, 80), error = %detail, "retrieval degraded to no result");
                RetrievalResult::NoneFound(NoneFoundReason::Unavailable(detail))
            }
        }
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedPassage>> {
        let lookup = async {
            let vector = tokio::time::timeout(self.encode_timeout, self.encoder.encode_query(query))
                .await
                .map_err(|_| {
                    anyhow!(
                        "query encoding timed out after {}s",
                        self.encode_timeout.as_secs_f32()
                    )
                })?
                .context("failed to encode query")?;
            let hits = tokio::time::timeout(self.search_timeout, self.store.search(&vector, top_k))
                .await
                .map_err(|_| {
                    anyhow!(
                        "vector search timed out after {}s",
                        self.search_timeout.as_secs_f32()
                    )
                })?
                .context("vector search failed")?;
            Ok::<_, anyhow::Error>(hits)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow!("cancelled")),
            outcome = lookup => outcome,
        }
    }
}
