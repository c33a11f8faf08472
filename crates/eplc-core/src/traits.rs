//! Capability interfaces consumed by the engine.
//!
//! Implementations live in `eplc-embed`, `eplc-store` and `eplc-llm`; tests
//! substitute scripted fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Fragment;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of every vector this embedder returns.
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Identifier used for provenance and logging.
    fn label(&self) -> &str;

    /// Fragments whose text contains `substring` (case-sensitive), at most
    /// `limit` of them, in store order. Returned fragments carry no distance.
    async fn exact_lookup(&self, substring: &str, limit: usize) -> Result<Vec<Fragment>>;

    /// The `k` nearest fragments to `query`, closest first, each carrying its distance.
    async fn vector_lookup(&self, query: &[f32], k: usize) -> Result<Vec<Fragment>>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}
