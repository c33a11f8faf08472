mod common;

use std::sync::Arc;

use common::{CountingEmbedder, FailingStore, Fixture, Reply, ScriptedModel, FixedStore};
use eplc_core::config::Settings;
use eplc_core::error::Error;
use eplc_core::types::Phase;
use eplc_engine::gate::{AUGMENTATION_CHECKLIST, REFUSAL};
use eplc_engine::prompts::{CONTEXT_BOUND_SYSTEM, FALLBACK_SYSTEM};
use eplc_engine::{Assistant, ConfidenceDecision, Conversation, DraftRequest};

#[tokio::test]
async fn no_stores_refuses_without_model_calls() {
    let model = ScriptedModel::new();
    let fixture = Fixture::new(model.clone());
    let assistant = fixture.assistant();

    let answer = assistant.answer_question("Who approves the stage gate?").await.unwrap();
    assert_eq!(answer.text, "Not specified in the provided context.");
    assert!(answer.citations.is_empty());
    assert_eq!(answer.decision, ConfidenceDecision::Refuse);
    assert_eq!(model.call_count(), 0);
    assert_eq!(fixture.embedder.calls(), 0);
}

#[tokio::test]
async fn distant_semantic_hits_alone_refuse() {
    let model = ScriptedModel::new();
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(FixedStore::new("EPLCFramework_db").with("far", "unrelated text", 0.9).shared());

    let answer = fixture.assistant().answer_question("retention period").await.unwrap();
    assert_eq!(answer.decision, ConfidenceDecision::Refuse);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn context_bound_answer_cites_exact_then_semantic() {
    let model = ScriptedModel::with_replies(["Records are kept for seven years."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(
        FixedStore::new("EPLCFramework_db")
            .with("e1", "retention period is seven years", 0.6)
            .with("e2", "stage gates close phases", 0.8)
            .shared(),
    );
    fixture.qa_stores.push(FixedStore::new("HHS_db").with("h1", "HHS records schedule", 0.3).shared());

    let answer = fixture.assistant().answer_question("retention period").await.unwrap();
    assert_eq!(answer.decision, ConfidenceDecision::ContextBound);
    assert_eq!(answer.text, "Records are kept for seven years.");
    // e1 matched exactly; h1 and e1 pass the 0.75 distance cutoff; e2 does not
    assert_eq!(answer.citations, vec!["e1", "h1", "e1"]);

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system, CONTEXT_BOUND_SYSTEM);
    assert_eq!(calls[0].temperature, 0.0);
    assert_eq!(
        calls[0].user,
        "CONTEXT:\nretention period is seven years\n\n---\n\nHHS records schedule\n\n---\n\nretention period is seven years\n\nQUESTION:\nretention period\n"
    );
}

#[tokio::test]
async fn refusal_triggers_exactly_one_fallback_call() {
    let model = ScriptedModel::with_replies(["  not specified in the provided context. ", "General answer."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(FixedStore::new("HHS_db").with("h1", "something nearby", 0.2).shared());

    let answer = fixture.assistant().answer_question("What is FedRAMP?").await.unwrap();
    assert_eq!(answer.decision, ConfidenceDecision::Fallback);
    assert_eq!(answer.text, "General answer.");
    assert_eq!(answer.citations, vec!["h1"]);

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].system, FALLBACK_SYSTEM);
    assert_eq!(calls[1].user, "What is FedRAMP?");
}

#[tokio::test]
async fn embedding_failure_still_answers_from_exact_hits() {
    let model = ScriptedModel::with_replies(["From the framework."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.embedder = CountingEmbedder::failing();
    fixture.qa_stores.push(FixedStore::new("EPLCFramework_db").with("e1", "project charter template", 0.1).shared());

    let answer = fixture.assistant().answer_question("project charter").await.unwrap();
    assert_eq!(answer.decision, ConfidenceDecision::ContextBound);
    assert_eq!(answer.citations, vec!["e1"]);
}

#[tokio::test]
async fn unavailable_store_degrades_to_the_other() {
    let model = ScriptedModel::with_replies(["Answer."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(Arc::new(FailingStore("EPLCFramework_db")));
    fixture.qa_stores.push(FixedStore::new("HHS_db").with("h1", "privacy impact", 0.1).shared());

    let answer = fixture.assistant().answer_question("privacy impact").await.unwrap();
    assert_eq!(answer.citations, vec!["h1", "h1"]);
}

#[tokio::test]
async fn synthesis_failure_is_surfaced() {
    let model = ScriptedModel::new();
    model.push(Reply::Fail("upstream 500".into()));
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(FixedStore::new("HHS_db").with("h1", "x", 0.1).shared());

    let err = fixture.assistant().answer_question("x").await.unwrap_err();
    assert!(matches!(err, Error::Synthesis(m) if m.contains("upstream 500")));
}

#[tokio::test]
async fn blank_question_is_invalid_input() {
    let assistant = Fixture::new(ScriptedModel::new()).assistant();
    assert!(matches!(assistant.answer_question("   ").await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn drafting_keeps_near_and_drops_far_fragments() {
    let model = ScriptedModel::with_replies(["Draft text.", "No major missing elements."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.phase_stores.push((
        Phase::Design,
        FixedStore::new("Design_db").with("near", "near guidance", 0.1).with("far", "far guidance", 0.9).shared(),
    ));
    let assistant = fixture.assistant();

    let request = DraftRequest::new(Phase::Design, "System Design Document", "Security", "Patient portal");
    let outcome = assistant.generate_draft(&request).await.unwrap();
    assert_eq!(outcome.context.citation_ids(), vec!["near"]);
    assert!((outcome.best_similarity - 0.9).abs() < 1e-6);
    assert!(!outcome.used_fallback_augmentation);
    assert_eq!(outcome.draft, "Draft text.");

    let calls = model.calls();
    assert!((calls[0].temperature - 0.2).abs() < 1e-6);
    assert!(calls[0].system.contains("(120-180 words)"));
    assert!(calls[0].user.starts_with("CONTEXT:\nnear guidance\n\nQUESTION:\nDraft the Security section"));
}

#[tokio::test]
async fn low_confidence_draft_gets_checklist() {
    let model = ScriptedModel::with_replies(["Thin draft."]);
    let mut fixture = Fixture::new(model.clone());
    fixture
        .phase_stores
        .push((Phase::Requirement, FixedStore::new("Requirement_db").with("weak", "weak", 0.8).shared()));

    let request = DraftRequest::new(Phase::Requirement, "Business Case", "Scope", "Claims intake");
    let outcome = fixture.assistant().generate_draft(&request).await.unwrap();
    assert!((outcome.best_similarity - 0.2).abs() < 1e-6);
    assert!(outcome.used_fallback_augmentation);
    assert_eq!(outcome.draft, format!("Thin draft.{AUGMENTATION_CHECKLIST}"));
    assert!(outcome.context.is_empty());
    assert!(model.calls()[0].user.starts_with("CONTEXT:\n(no strong matches)\n\n"));
}

#[tokio::test]
async fn unconfigured_phase_is_invalid_input() {
    let assistant = Fixture::new(ScriptedModel::new()).assistant();
    let request = DraftRequest::new(Phase::Development, "t", "s", "d");
    assert!(matches!(assistant.generate_draft(&request).await, Err(Error::InvalidInput(_))));
    assert!(matches!(assistant.answer_in_phase("q", Phase::Development).await, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn phase_answer_uses_guide_prompt_without_citations() {
    let model = ScriptedModel::with_replies(["Phase answer."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.phase_stores.push((
        Phase::Implementation,
        FixedStore::new("Implementation_db").with("i1", "cutover plan", 0.2).shared(),
    ));

    let answer = fixture.assistant().answer_in_phase("What is a cutover?", Phase::Implementation).await.unwrap();
    assert_eq!(answer.text, "Phase answer.");
    assert!(answer.citations.is_empty());
    let call = &model.calls()[0];
    assert!(call.system.starts_with("You are an EPLC (Enterprise Product Lifecycle) assistant."));
    assert!(call.user.contains("QUESTION:\nWhat is a cutover?\n\nPlease provide a clear and helpful answer"));
}

#[tokio::test]
async fn conversation_records_turns_and_restarts() {
    let model = ScriptedModel::with_replies(["One.", "Two."]);
    let mut fixture = Fixture::new(model.clone());
    fixture.qa_stores.push(FixedStore::new("EPLCFramework_db").with("e1", "charter", 0.1).shared());
    let assistant = fixture.assistant();

    let mut conversation = Conversation::new(&assistant);
    assert_eq!(conversation.ask("charter").await.unwrap().answer, "One.");
    let second = conversation.ask(" charter ").await.unwrap().clone();
    assert_eq!(second.answer, "Two.");
    assert_eq!(conversation.exchanges().len(), 2);
    assert_eq!(conversation.exchanges().last(), Some(&second), "ask returns the recorded exchange");
    assert_eq!(conversation.exchanges()[1].question, "charter");
    assert!(conversation.ask("").await.is_err());
    assert_eq!(conversation.exchanges().len(), 2);

    conversation.restart();
    assert!(conversation.exchanges().is_empty());
}

#[test]
fn builder_requires_every_capability() {
    let result = Assistant::builder(&Settings::default()).model(ScriptedModel::new()).build();
    assert!(matches!(result, Err(Error::Configuration(_))));
}
