//! Language-model completion under a fixed system policy.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use eplc_core::config::GenerationSettings;
use eplc_core::error::{Error, Result};
use eplc_core::traits::LanguageModel;

use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPolicy {
    /// Answer only from the supplied context, emitting the refusal marker otherwise.
    ContextBound,
    /// General knowledge, no reference to any context.
    Fallback,
    /// EPLC drafting persona with the configured word band.
    Drafting,
    /// Single-phase guidance answers.
    PhaseGuide,
}

pub struct Synthesizer {
    model: Arc<dyn LanguageModel>,
    generation: GenerationSettings,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, generation: GenerationSettings) -> Self {
        Self { model, generation }
    }

    pub fn system_prompt(&self, policy: SystemPolicy) -> Cow<'static, str> {
        match policy {
            SystemPolicy::ContextBound => Cow::Borrowed(prompts::CONTEXT_BOUND_SYSTEM),
            SystemPolicy::Fallback => Cow::Borrowed(prompts::FALLBACK_SYSTEM),
            SystemPolicy::PhaseGuide => Cow::Borrowed(prompts::PHASE_GUIDE_SYSTEM),
            SystemPolicy::Drafting => Cow::Owned(prompts::drafting_system(
                self.generation.target_min_words,
                self.generation.target_max_words,
            )),
        }
    }

    pub fn temperature(&self, policy: SystemPolicy) -> f32 {
        match policy {
            SystemPolicy::ContextBound | SystemPolicy::Fallback => self.generation.answer_temperature,
            SystemPolicy::Drafting | SystemPolicy::PhaseGuide => self.generation.drafting_temperature,
        }
    }

    /// One completion. With a context the user prompt is prefixed by a
    /// `CONTEXT:` block; without one the instruction is sent as-is.
    pub async fn synthesize(&self, policy: SystemPolicy, context: Option<&str>, instruction: &str) -> Result<String> {
        let user = match context {
            Some(ctx) => prompts::with_context(ctx, instruction),
            None => instruction.to_string(),
        };
        let start = Instant::now();
        let text = self
            .model
            .complete(&self.system_prompt(policy), &user, self.temperature(policy))
            .await
            .map_err(|e| {
                warn!(?policy, error = %e, "synthesis failed");
                match e {
                    Error::Synthesis(_) => e,
                    other => Error::Synthesis(other.to_string()),
                }
            })?;
        debug!(?policy, elapsed_ms = start.elapsed().as_millis() as u64, "synthesized");
        Ok(text)
    }
}
