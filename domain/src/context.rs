//! Turns retrieved payloads into the text block handed to the prompt.
//!
//! Payloads come from several ingestion jobs that never agreed on a field
//! name for the answer text, so extraction tries a fixed list of aliases.

use crate::models::{ContextBlock, Payload, RetrievedPassage};
use serde_json::Value;

pub const DEFAULT_TEXT_ALIASES: [&str; 3] = ["answer", "tra_loi", "text"];

const BULLET: &str = "- ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadExtractor {
    aliases: Vec<String>,
}

impl Default for PayloadExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_ALIASES)
    }
}

impl PayloadExtractor {
    /// Aliases are tried in the order given.
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// First alias holding non-empty content wins.
    pub fn extract(&self, payload: &Payload) -> Option<String> {
        self.aliases
            .iter()
            .filter_map(|key| payload.get(key))
            .find_map(content_of)
    }

    pub fn build_context(&self, passages: &[RetrievedPassage]) -> ContextBlock {
        let lines: Vec<String> = passages
            .iter()
            .filter_map(|p| self.extract(&p.payload))
            .map(|content| format!("{BULLET}{content}"))
            .collect();
        ContextBlock(lines.join("\n"))
    }
}

/// Only scalar text counts. Every number renders, `0` included; booleans,
/// arrays and objects are never treated as answer text even when non-empty.
fn content_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Assemble with the default alias list.
pub fn build_context(passages: &[RetrievedPassage]) -> ContextBlock {
    PayloadExtractor::default().build_context(passages)
}
