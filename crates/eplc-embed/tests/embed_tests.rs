use eplc_core::config::Settings;
use eplc_core::traits::Embedder;
use eplc_embed::{drafting_embedder, qa_embedder, FakeEmbedder};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(1024);
    let v1 = embedder.embed("hello world").await.expect("embed");
    let v2 = embedder.embed("hello world").await.expect("embed");

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[tokio::test]
async fn fake_embedder_separates_unrelated_texts() {
    let embedder = FakeEmbedder::new(256);
    let a = embedder.embed("system security plan").await.expect("embed");
    let b = embedder.embed("system security plan").await.expect("embed");
    let c = embedder.embed("quarterly budget forecast").await.expect("embed");
    let dot = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| p * q).sum::<f32>();
    assert!(dot(&a, &b) > dot(&a, &c));
}

#[test]
fn fake_flag_selects_fake_embedders_with_configured_dims() {
    let mut settings = Settings::default();
    settings.use_fake_embeddings = true;
    settings.openai.embedding_dimensions = 64;
    settings.local_embedder.dimension = 32;

    let drafting = drafting_embedder(&settings).expect("drafting embedder");
    let qa = qa_embedder(&settings).expect("qa embedder");
    assert_eq!(drafting.dim(), 64);
    assert_eq!(qa.dim(), 32);
}
