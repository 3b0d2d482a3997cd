use domain::models::{EmbeddingVector, Payload, RetrievedPassage};
use domain::ports::VectorStore;
use shared::types::Result;

/// Brute-force cosine store held in memory, ranked like the remote store.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    points: Vec<(Vec<f32>, Payload)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vector: Vec<f32>, payload: Payload) {
        self.points.push((vector, payload));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    pub fn find_relevant(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let mut similarities = Vec::with_capacity(self.points.len());
        for (vector, payload) in &self.points {
            if vector.len() != query.len() {
                anyhow::bail!(
                    "vector dimension error: expected dim: {}, got {}",
                    vector.len(),
                    query.len()
                );
            }
            similarities.push((Self::cosine_similarity(query, vector), payload));
        }

        similarities.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(similarities
            .into_iter()
            .take(top_k)
            .map(|(score, payload)| RetrievedPassage::new(score, payload.clone()))
            .collect())
    }
}

impl VectorStore for InMemoryStore {
    async fn search(&self, vector: &EmbeddingVector, limit: usize) -> Result<Vec<RetrievedPassage>> {
        self.find_relevant(vector.as_slice(), limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn payload(text: &str) -> Payload {
        let Value::Object(map) = json!({ "text": text }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn ranks_by_cosine_similarity() {
        let mut store = InMemoryStore::new();
        store.insert(vec![0.0, 1.0], payload("orthogonal"));
        store.insert(vec![1.0, 0.0], payload("same direction"));
        store.insert(vec![1.0, 1.0], payload("diagonal"));

        let hits = store.find_relevant(&[2.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload["text"], "same direction");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].payload["text"], "diagonal");
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut store = InMemoryStore::new();
        store.insert(vec![1.0, 0.0, 0.0], payload("3d"));
        assert!(store.find_relevant(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(InMemoryStore::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
