use eplc_cli::bootstrap::{build_assistant, open_phase_stores, open_qa_stores, Surface};
use eplc_core::config::Settings;
use eplc_core::error::Error;
use eplc_core::traits::KnowledgeStore;
use eplc_core::types::Phase;
use eplc_embed::FakeEmbedder;
use eplc_store::{write_fragments, FragmentRow};

async fn seed(root: &std::path::Path, store: &str, texts: &[&str]) -> anyhow::Result<()> {
    let embedder = FakeEmbedder::new(16);
    let rows: Vec<FragmentRow> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| FragmentRow { id: format!("{store}-{i}"), text: t.to_string(), vector: embedder.embed_sync(t) })
        .collect();
    write_fragments(&root.join(store).to_string_lossy(), "fragments", &rows).await?;
    Ok(())
}

fn offline_settings(root: &std::path::Path) -> Settings {
    let mut s = Settings::default();
    s.use_fake_embeddings = true;
    s.openai.api_key = Some("sk-test".into());
    s.openai.embedding_dimensions = 16;
    s.local_embedder.dimension = 16;
    s.stores.root = root.to_string_lossy().into_owned();
    s
}

#[tokio::test]
async fn missing_qa_store_is_a_configuration_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    seed(dir.path(), "EPLCFramework_db", &["stage gate review"]).await?;
    let settings = offline_settings(dir.path());

    let result = open_qa_stores(&settings).await;
    assert!(matches!(result, Err(Error::Configuration(m)) if m.contains("HHS_db")));
    Ok(())
}

#[tokio::test]
async fn blank_store_names_are_skipped_and_phases_are_optional() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    seed(dir.path(), "EPLCFramework_db", &["stage gate review", "project charter"]).await?;
    seed(dir.path(), "Design_db", &["security architecture guidance"]).await?;
    let mut settings = offline_settings(dir.path());
    settings.stores.hhs = String::new();

    let qa = open_qa_stores(&settings).await?;
    assert_eq!(qa.len(), 1);
    assert_eq!(qa[0].label(), "EPLCFramework_db");

    let phases = open_phase_stores(&settings).await;
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].0, Phase::Design);

    let assistant = build_assistant(&settings, Surface::Ask).await?;
    assert!(assistant.has_qa_stores());
    assert_eq!(assistant.phases().collect::<Vec<_>>(), vec![Phase::Design]);

    let drafting = build_assistant(&settings, Surface::Draft).await?;
    assert!(!drafting.has_qa_stores());
    Ok(())
}
