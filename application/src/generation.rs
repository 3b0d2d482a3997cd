use domain::error::RagError;
use domain::models::Prompt;
use domain::prompt::{IM_END, IM_START};
use domain::ports::{DecodingParams, TextGenerator};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Long-lived wrapper around the language model. Bounds concurrent
/// generations, applies a timeout and cleans the raw continuation.
pub struct GenerationEngine<G> {
    generator: G,
    params: DecodingParams,
    permits: Semaphore,
    timeout: Duration,
}

impl<G: TextGenerator> GenerationEngine<G> {
    /// One generation in flight at a time.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            params: DecodingParams::default(),
            permits: Semaphore::new(1),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_params(mut self, params: DecodingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.permits = Semaphore::new(concurrency.max(1));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn params(&self) -> &DecodingParams {
        &self.params
    }

    pub async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<String, RagError> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            permit = self.permits.acquire() => permit
                .map_err(|_| RagError::GenerationFailure("generation engine is shut down".into()))?,
        };

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            outcome = tokio::time::timeout(self.timeout, self.generator.generate(prompt, &self.params)) => {
                match outcome {
                    Ok(Ok(text)) => text,
                    Ok(Err(err)) => return Err(RagError::GenerationFailure(format!("{err:#}"))),
                    Err(_) => {
                        return Err(RagError::GenerationFailure(format!(
                            "generation timed out after {}s",
                            self.timeout.as_secs_f32()
                        )))
                    }
                }
            }
        };

        debug!(raw_chars = raw.chars().count(), "generation finished");
        Ok(clean_output(&raw))
    }

    /// Refuse new work; generations already holding a permit finish.
    pub fn close(&self) {
        self.permits.close();
    }
}

fn cancelled() -> RagError {
    RagError::GenerationFailure("generation cancelled".into())
}

/// Drop anything after an end-of-turn marker the model leaked, then trim.
pub fn clean_output(raw: &str) -> String {
    let end = [IM_END, IM_START]
        .iter()
        .filter_map(|marker| raw.find(marker))
        .min()
        .unwrap_or(raw.len());
    raw[..end].trim().to_string()
}
