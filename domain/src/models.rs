use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field-name → value mapping stored next to every indexed vector.
pub type Payload = Map<String, Value>;

/// Text to prepend before embedding. The e5 family is trained with distinct
/// prefixes for questions and for indexed passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    Query,
    Passage,
}

impl EmbeddingMode {
    pub fn prefix(self) -> &'static str {
        match self {
            EmbeddingMode::Query => "query: ",
            EmbeddingMode::Passage => "passage: ",
        }
    }

    pub fn apply(self, text: &str) -> String {
        format!("{}{}", self.prefix(), text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub score: f32,
    /// Absent and `null` payloads both decode as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub payload: Payload,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Payload, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Payload>::deserialize(deserializer)?.unwrap_or_default())
}

impl RetrievedPassage {
    pub fn new(score: f32, payload: Payload) -> Self {
        Self { score, payload }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoneFoundReason {
    /// The store returned no candidates at all.
    NoCandidates,
    /// Candidates came back but none beat the threshold.
    BelowThreshold { best_score: f32 },
    /// Encoding or search failed; the detail is kept for logs only.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalResult {
    NoneFound(NoneFoundReason),
    /// Non-empty, descending by score, at most `top_k` long.
    Found(Vec<RetrievedPassage>),
}

impl RetrievalResult {
    /// Apply the strict `score > threshold` rule to raw store hits.
    pub fn from_candidates(
        mut candidates: Vec<RetrievedPassage>,
        threshold: f32,
        top_k: usize,
    ) -> Self {
        if candidates.is_empty() {
            return RetrievalResult::NoneFound(NoneFoundReason::NoCandidates);
        }
        let best_score = candidates
            .iter()
            .map(|c| c.score)
            .fold(f32::NEG_INFINITY, f32::max);

        candidates.retain(|c| c.score > threshold);
        if candidates.is_empty() {
            return RetrievalResult::NoneFound(NoneFoundReason::BelowThreshold { best_score });
        }

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(top_k);
        RetrievalResult::Found(candidates)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RetrievalResult::Found(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock(pub String);

impl ContextBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(pub String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What to do when passages were found but none carried usable text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyContextPolicy {
    /// Generate anyway from an empty context block.
    #[default]
    Generate,
    /// Answer with the refusal message.
    Refuse,
}

impl std::str::FromStr for EmptyContextPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" => Ok(EmptyContextPolicy::Generate),
            "refuse" => Ok(EmptyContextPolicy::Refuse),
            other => Err(format!("unknown empty context policy '{other}'")),
        }
    }
}

/// Shown when nothing relevant was retrieved, or the store was unreachable.
pub const REFUSAL_MESSAGE: &str =
    "Xin lỗi, tôi không tìm thấy thông tin phù hợp trong cơ sở dữ liệu để trả lời câu hỏi này.";

/// Prefix of the message shown when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Lỗi sinh câu trả lời: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Generated(String),
    Refused,
    GenerationFailed(String),
}

impl Answer {
    pub fn into_text(self) -> String {
        match self {
            Answer::Generated(text) => text,
            Answer::Refused => REFUSAL_MESSAGE.to_string(),
            Answer::GenerationFailed(detail) => format!("{GENERATION_ERROR_PREFIX}{detail}"),
        }
    }
}
