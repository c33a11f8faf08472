//! Dual-mode retrieval across an injectable list of knowledge stores.
//!
//! Both paths fan out to every store concurrently. A store that fails is
//! logged and skipped; only an embedding failure aborts the semantic path.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use eplc_core::error::{Error, Result};
use eplc_core::traits::{Embedder, KnowledgeStore};
use eplc_core::types::{Fragment, RetrievalResult};

/// Keep-rule applied to semantic hits before fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Keep when `1 - distance >= s`.
    MinSimilarity(f32),
    /// Keep when `distance < d`.
    MaxDistance(f32),
}

impl Threshold {
    pub fn keeps(&self, fragment: &Fragment) -> bool {
        match *self {
            Threshold::MinSimilarity(s) => fragment.similarity() >= s,
            Threshold::MaxDistance(d) => fragment.distance.is_some_and(|dist| dist < d),
        }
    }
}

pub fn filter_by_threshold(result: &RetrievalResult, threshold: Threshold) -> RetrievalResult {
    result.fragments().iter().filter(|f| threshold.keeps(f)).cloned().collect()
}

#[derive(Clone)]
pub struct Retriever {
    stores: Vec<Arc<dyn KnowledgeStore>>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(stores: Vec<Arc<dyn KnowledgeStore>>, embedder: Arc<dyn Embedder>) -> Self {
        Self { stores, embedder }
    }

    pub fn has_stores(&self) -> bool {
        !self.stores.is_empty()
    }

    /// Containment matches from every store, concatenated in store order and
    /// truncated to `k`.
    pub async fn retrieve_exact(&self, query: &str, k: usize) -> RetrievalResult {
        if k == 0 || self.stores.is_empty() {
            return RetrievalResult::default();
        }
        let lookups = self.stores.iter().map(|store| store.exact_lookup(query, k));
        let mut merged = Vec::new();
        for (store, outcome) in self.stores.iter().zip(join_all(lookups).await) {
            match outcome {
                Ok(hits) => merged.extend(hits),
                Err(e) => warn!(store = store.label(), error = %e, "exact lookup failed, skipping store"),
            }
        }
        merged.truncate(k);
        debug!(hits = merged.len(), "exact retrieval");
        RetrievalResult::new(merged)
    }

    /// Global top-`k` by distance over every store's own top-`k`.
    pub async fn retrieve_semantic(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 || self.stores.is_empty() {
            return Ok(RetrievalResult::default());
        }
        let start = Instant::now();
        let embedding = self.embedder.embed(query).await.map_err(|e| match e {
            Error::Embedding(_) => e,
            other => Error::Embedding(other.to_string()),
        })?;

        let lookups = self.stores.iter().map(|store| store.vector_lookup(&embedding, k));
        let mut merged: Vec<Fragment> = Vec::new();
        for (store, outcome) in self.stores.iter().zip(join_all(lookups).await) {
            match outcome {
                Ok(hits) => merged.extend(hits),
                Err(e) => warn!(store = store.label(), error = %e, "vector lookup failed, skipping store"),
            }
        }
        merged.sort_by(|a, b| a.score().total_cmp(&b.score()));
        merged.truncate(k);
        debug!(
            hits = merged.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "semantic retrieval"
        );
        Ok(RetrievalResult::new(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits() -> RetrievalResult {
        RetrievalResult::new(vec![
            Fragment::semantic("near", "n", 0.1, "s"),
            Fragment::semantic("mid", "m", 0.5, "s"),
            Fragment::semantic("far", "f", 0.9, "s"),
            Fragment::semantic("bad", "b", f32::NAN, "s"),
        ])
    }

    #[test]
    fn min_similarity_is_inclusive() {
        let kept = filter_by_threshold(&hits(), Threshold::MinSimilarity(0.5));
        assert_eq!(kept.ids(), vec!["near", "mid"]);
    }

    #[test]
    fn max_distance_is_exclusive() {
        let kept = filter_by_threshold(&hits(), Threshold::MaxDistance(0.5));
        assert_eq!(kept.ids(), vec!["near"]);
    }

    #[test]
    fn exact_hits_never_pass_a_distance_cutoff() {
        let result = RetrievalResult::new(vec![Fragment::exact("e", "x", "s")]);
        assert!(filter_by_threshold(&result, Threshold::MaxDistance(0.75)).is_empty());
    }
}
