//! eplc-embed
//!
//! Embedder adapters: a remote OpenAI-compatible client (drafting path), an
//! in-process BERT model (question answering path) and a deterministic hash
//! embedder used whenever `use_fake_embeddings` is set.

pub mod device;
pub mod fake;
pub mod local;
pub mod pool;
pub mod remote;
pub mod tokenize;

use std::sync::Arc;
use tracing::info;

use eplc_core::config::Settings;
use eplc_core::error::Result;
use eplc_core::traits::Embedder;

pub use fake::FakeEmbedder;
pub use local::LocalEmbedder;
pub use eplc_core::config::Pooling;
pub use pool::{cls_l2, masked_mean_l2};
pub use remote::RemoteEmbedder;

/// High-dimensional remote embedder used to query the per-phase drafting stores.
pub fn drafting_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake_embeddings {
        info!(dim = settings.openai.embedding_dimensions, "using FakeEmbedder for drafting");
        return Ok(Arc::new(FakeEmbedder::new(settings.openai.embedding_dimensions)));
    }
    Ok(Arc::new(RemoteEmbedder::from_settings(settings)?))
}

/// Local embedder used to query the question-answering stores.
pub fn qa_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake_embeddings {
        info!(dim = settings.local_embedder.dimension, "using FakeEmbedder for question answering");
        return Ok(Arc::new(FakeEmbedder::new(settings.local_embedder.dimension)));
    }
    Ok(Arc::new(LocalEmbedder::load(&settings.local_embedder)?))
}
