use crate::models::NoneFoundReason;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RagError {
    /// Store unreachable, timed out, rejected the credential, or encoding failed.
    #[error("vector store unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("no relevant context")]
    NoRelevantContext,

    #[error("{0}")]
    GenerationFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("embedding dimension mismatch: collection expects {expected}, model produces {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<NoneFoundReason> for RagError {
    fn from(reason: NoneFoundReason) -> Self {
        match reason {
            NoneFoundReason::Unavailable(detail) => RagError::RetrievalUnavailable(detail),
            NoneFoundReason::NoCandidates | NoneFoundReason::BelowThreshold { .. } => {
                RagError::NoRelevantContext
            }
        }
    }
}
