use std::fmt::Display;

use thiserror::Error;

/// Failure taxonomy shared by every crate in the workspace.
///
/// Retrieval-layer variants (`Embedding`, `StoreUnavailable`) are expected to
/// be degraded around by the caller. `Synthesis` is reported verbatim for the
/// current turn. `Configuration` is fatal at startup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Knowledge store '{store}' unavailable: {reason}")]
    StoreUnavailable { store: String, reason: String },

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl Error {
    pub fn store_unavailable(store: impl Into<String>, reason: impl Display) -> Self {
        Self::StoreUnavailable { store: store.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
