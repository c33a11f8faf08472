use async_trait::async_trait;

use eplc_core::error::{Error, Result};
use eplc_core::traits::KnowledgeStore;
use eplc_core::types::Fragment;

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    text: String,
    vector: Vec<f32>,
}

/// Brute-force store held entirely in memory. Distances are cosine distances.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    label: String,
    entries: Vec<Entry>,
}

impl MemoryStore {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), entries: Vec::new() }
    }

    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>, vector: Vec<f32>) {
        self.entries.push(Entry { id: id.into(), text: text.into(), vector });
    }

    pub fn with_fragment(mut self, id: impl Into<String>, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.insert(id, text, vector);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `1 - cos(a, b)`; a zero vector is treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn exact_lookup(&self, substring: &str, limit: usize) -> Result<Vec<Fragment>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.text.contains(substring))
            .take(limit)
            .map(|e| Fragment::exact(&e.id, &e.text, &self.label))
            .collect())
    }

    async fn vector_lookup(&self, query: &[f32], k: usize) -> Result<Vec<Fragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if let Some(bad) = self.entries.iter().find(|e| e.vector.len() != query.len()) {
            return Err(Error::store_unavailable(
                &self.label,
                format!("fragment '{}' has {} dimensions, query has {}", bad.id, bad.vector.len(), query.len()),
            ));
        }
        let mut scored: Vec<(f32, &Entry)> =
            self.entries.iter().map(|e| (cosine_distance(query, &e.vector), e)).collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(d, e)| Fragment::semantic(&e.id, &e.text, d, &self.label))
            .collect())
    }
}
