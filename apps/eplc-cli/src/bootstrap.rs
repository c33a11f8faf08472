//! Opens the configured stores and adapters and assembles an [`Assistant`].

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use eplc_core::config::Settings;
use eplc_core::error::{Error, Result};
use eplc_core::traits::KnowledgeStore;
use eplc_core::types::Phase;
use eplc_engine::Assistant;
use eplc_llm::OpenAiChat;
use eplc_store::LanceStore;

/// Which terminal is starting; drafting never loads the question-answering stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Ask,
    Draft,
}

async fn open_store(label: &str, location: &Path, table: Option<&str>) -> Result<Arc<dyn KnowledgeStore>> {
    let uri = location.to_string_lossy();
    Ok(Arc::new(LanceStore::open(label, &uri, table).await?))
}

/// The question-answering stores. A configured store whose location is
/// missing or unreadable is a startup failure.
pub async fn open_qa_stores(settings: &Settings) -> Result<Vec<Arc<dyn KnowledgeStore>>> {
    let table = settings.stores.table.as_deref();
    let mut stores = Vec::new();
    for (label, location) in settings.stores.qa_locations() {
        if !location.exists() {
            return Err(Error::Configuration(format!("store '{label}' not found at {}", location.display())));
        }
        let store = open_store(&label, &location, table)
            .await
            .map_err(|e| Error::Configuration(format!("cannot open store '{label}': {e}")))?;
        stores.push(store);
    }
    Ok(stores)
}

/// The per-phase drafting stores that could be opened. Missing phases are
/// logged; drafting for them is rejected later.
pub async fn open_phase_stores(settings: &Settings) -> Vec<(Phase, Arc<dyn KnowledgeStore>)> {
    let table = settings.stores.table.as_deref();
    let mut stores = Vec::new();
    for phase in Phase::ALL {
        let (label, location) = settings.stores.phase_location(phase);
        if !location.exists() {
            warn!(%phase, location = %location.display(), "phase store not found");
            continue;
        }
        match open_store(&label, &location, table).await {
            Ok(store) => stores.push((phase, store)),
            Err(e) => warn!(%phase, error = %e, "phase store unavailable"),
        }
    }
    stores
}

pub async fn build_assistant(settings: &Settings, surface: Surface) -> Result<Assistant> {
    let model = Arc::new(OpenAiChat::from_settings(settings)?);
    let mut builder = Assistant::builder(settings)
        .model(model)
        .drafting_embedder(eplc_embed::drafting_embedder(settings)?);

    for (phase, store) in open_phase_stores(settings).await {
        builder = builder.phase_store(phase, store);
    }
    if surface == Surface::Ask {
        let qa_stores = open_qa_stores(settings).await?;
        if !qa_stores.is_empty() {
            builder = builder.qa_embedder(eplc_embed::qa_embedder(settings)?);
        }
        for store in qa_stores {
            builder = builder.qa_store(store);
        }
    }
    let assistant = builder.build()?;
    info!(
        ?surface,
        qa_stores = assistant.has_qa_stores(),
        phases = ?assistant.phases().collect::<Vec<_>>(),
        model = %settings.generation.chat_model,
        "assistant ready"
    );
    Ok(assistant)
}
