//! eplc-store
//!
//! Knowledge-store adapters: a LanceDB-backed store for persisted corpora and
//! an in-memory store for tests and small fixtures.

pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::{write_fragments, FragmentRow, LanceStore};
pub use memory::{cosine_distance, MemoryStore};
