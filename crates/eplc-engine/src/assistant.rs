//! Facade tying retrieval, gating and synthesis together.
//!
//! Question answering queries the domain stores with both exact and semantic
//! retrieval; drafting queries a single phase store semantically.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use eplc_core::config::{GenerationSettings, RetrievalSettings, Settings};
use eplc_core::error::{Error, Result};
use eplc_core::traits::{Embedder, KnowledgeStore, LanguageModel};
use eplc_core::types::{Phase, RetrievalResult};

use crate::completeness::CompletenessChecker;
use crate::context::FusedContext;
use crate::gate::{self, ConfidenceDecision, REFUSAL};
use crate::prompts;
use crate::request::DraftRequest;
use crate::retriever::{filter_by_threshold, Retriever, Threshold};
use crate::synthesizer::{SystemPolicy, Synthesizer};

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Ids of the fused fragments, exact hits first.
    pub citations: Vec<String>,
    pub decision: ConfidenceDecision,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutcome {
    pub draft: String,
    pub used_fallback_augmentation: bool,
    /// Semantic hits that passed the similarity filter.
    pub context: FusedContext,
    /// Best similarity over all semantic hits before filtering.
    pub best_similarity: f32,
}

pub struct Assistant {
    qa: Retriever,
    phases: BTreeMap<Phase, Retriever>,
    synthesizer: Synthesizer,
    checker: CompletenessChecker,
    retrieval: RetrievalSettings,
    generation: GenerationSettings,
}

impl Assistant {
    pub fn builder(settings: &Settings) -> AssistantBuilder {
        AssistantBuilder::new(settings)
    }

    pub fn has_qa_stores(&self) -> bool {
        self.qa.has_stores()
    }

    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.phases.keys().copied()
    }

    fn phase_retriever(&self, phase: Phase) -> Result<&Retriever> {
        self.phases
            .get(&phase)
            .ok_or_else(|| Error::InvalidInput(format!("no knowledge store configured for the {phase} phase")))
    }

    /// Dual exact + semantic retrieval over the domain stores, then the
    /// refuse / context-bound / fallback cascade.
    pub async fn answer_question(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".into()));
        }
        let k = self.retrieval.top_k;
        let (exact, semantic) =
            futures::join!(self.qa.retrieve_exact(question, k), self.qa.retrieve_semantic(question, k));
        let semantic = semantic.unwrap_or_else(|e| {
            warn!(error = %e, "semantic retrieval failed, continuing with exact matches");
            RetrievalResult::default()
        });
        let kept = filter_by_threshold(&semantic, Threshold::MaxDistance(self.retrieval.sem_threshold));
        info!(exact = exact.len(), semantic = semantic.len(), kept = kept.len(), "question retrieval");
        let context = FusedContext::fuse(exact, kept);

        match gate::decide(&context) {
            ConfidenceDecision::Refuse => {
                info!(decision = ConfidenceDecision::Refuse.as_str(), "no domain context");
                Ok(Answer { text: REFUSAL.to_string(), citations: Vec::new(), decision: ConfidenceDecision::Refuse })
            }
            _ => self.answer_from_context(question, context).await,
        }
    }

    async fn answer_from_context(&self, question: &str, context: FusedContext) -> Result<Answer> {
        let bound = self
            .synthesizer
            .synthesize(SystemPolicy::ContextBound, Some(&context.render()), &prompts::question(question))
            .await?;
        let decision = gate::reassess(&bound);
        let text = match decision {
            ConfidenceDecision::Fallback => {
                info!(decision = decision.as_str(), "context insufficient, answering from general knowledge");
                self.synthesizer.synthesize(SystemPolicy::Fallback, None, question).await?
            }
            _ => bound,
        };
        Ok(Answer { text, citations: context.citation_ids(), decision })
    }

    /// Semantic answer from one phase store. Carries no citations and never
    /// falls back.
    pub async fn answer_in_phase(&self, question: &str, phase: Phase) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".into()));
        }
        let retriever = self.phase_retriever(phase)?;
        let semantic = self.semantic_or_empty(retriever, question).await;
        let context =
            FusedContext::from_semantic(filter_by_threshold(
                &semantic,
                Threshold::MinSimilarity(self.retrieval.sim_filter),
            ));
        let text = self
            .synthesizer
            .synthesize(SystemPolicy::PhaseGuide, Some(&context.render()), &prompts::phase_question(question))
            .await?;
        Ok(Answer { text, citations: Vec::new(), decision: ConfidenceDecision::ContextBound })
    }

    async fn semantic_or_empty(&self, retriever: &Retriever, query: &str) -> RetrievalResult {
        retriever.retrieve_semantic(query, self.retrieval.top_k).await.unwrap_or_else(|e| {
            warn!(error = %e, "semantic retrieval failed, continuing without context");
            RetrievalResult::default()
        })
    }

    pub async fn generate_draft(&self, request: &DraftRequest) -> Result<DraftOutcome> {
        request.validate()?;
        let retriever = self.phase_retriever(request.phase)?;
        let semantic = self.semantic_or_empty(retriever, &request.query_text()).await;
        let best_similarity = semantic.best_similarity();
        let context =
            FusedContext::from_semantic(filter_by_threshold(
                &semantic,
                Threshold::MinSimilarity(self.retrieval.sim_filter),
            ));

        let (min, max) = (self.generation.target_min_words, self.generation.target_max_words);
        let mut draft = self
            .synthesizer
            .synthesize(SystemPolicy::Drafting, Some(&context.render()), &prompts::initial_draft(request, min, max))
            .await?;
        let used_fallback_augmentation = gate::needs_augmentation(best_similarity, self.retrieval.min_sim);
        if used_fallback_augmentation {
            draft = gate::augment(draft);
        }
        info!(
            phase = %request.phase,
            section = %request.section,
            kept = context.len(),
            best_similarity,
            augmented = used_fallback_augmentation,
            "draft generated"
        );
        Ok(DraftOutcome { draft, used_fallback_augmentation, context, best_similarity })
    }

    /// A fresh version of the section from the same context and details.
    pub async fn regenerate_draft(&self, request: &DraftRequest, context: &FusedContext) -> Result<String> {
        let (min, max) = (self.generation.target_min_words, self.generation.target_max_words);
        self.synthesizer
            .synthesize(SystemPolicy::Drafting, Some(&context.render()), &prompts::regenerate(request, min, max))
            .await
    }

    pub async fn refine_draft(&self, context: &FusedContext, current_draft: &str, follow_up: &str) -> Result<String> {
        self.synthesizer
            .synthesize(SystemPolicy::Drafting, Some(&context.render()), &prompts::refine(current_draft, follow_up))
            .await
    }

    pub async fn check_completeness(&self, template_context: &str, details: &str) -> Result<String> {
        self.checker.check(template_context, details).await
    }
}

/// Collects stores, embedders and the model before assembling an [`Assistant`].
pub struct AssistantBuilder {
    retrieval: RetrievalSettings,
    generation: GenerationSettings,
    qa_stores: Vec<Arc<dyn KnowledgeStore>>,
    phase_stores: BTreeMap<Phase, Arc<dyn KnowledgeStore>>,
    qa_embedder: Option<Arc<dyn Embedder>>,
    drafting_embedder: Option<Arc<dyn Embedder>>,
    model: Option<Arc<dyn LanguageModel>>,
}

impl AssistantBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            retrieval: settings.retrieval.clone(),
            generation: settings.generation.clone(),
            qa_stores: Vec::new(),
            phase_stores: BTreeMap::new(),
            qa_embedder: None,
            drafting_embedder: None,
            model: None,
        }
    }

    /// Adds a question-answering store; stores are queried in insertion order.
    pub fn qa_store(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.qa_stores.push(store);
        self
    }

    pub fn phase_store(mut self, phase: Phase, store: Arc<dyn KnowledgeStore>) -> Self {
        self.phase_stores.insert(phase, store);
        self
    }

    pub fn qa_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.qa_embedder = Some(embedder);
        self
    }

    pub fn drafting_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.drafting_embedder = Some(embedder);
        self
    }

    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn build(self) -> Result<Assistant> {
        let drafting_embedder =
            self.drafting_embedder.ok_or_else(|| Error::Configuration("drafting embedder not set".into()))?;
        // without question-answering stores the embedder is never called
        let qa_embedder = match self.qa_embedder {
            Some(embedder) => embedder,
            None if self.qa_stores.is_empty() => Arc::clone(&drafting_embedder),
            None => return Err(Error::Configuration("question-answering embedder not set".into())),
        };
        let model = self.model.ok_or_else(|| Error::Configuration("language model not set".into()))?;

        let phases = self
            .phase_stores
            .into_iter()
            .map(|(phase, store)| (phase, Retriever::new(vec![store], Arc::clone(&drafting_embedder))))
            .collect();
        Ok(Assistant {
            qa: Retriever::new(self.qa_stores, qa_embedder),
            phases,
            synthesizer: Synthesizer::new(Arc::clone(&model), self.generation.clone()),
            checker: CompletenessChecker::new(model),
            retrieval: self.retrieval,
            generation: self.generation,
        })
    }
}
