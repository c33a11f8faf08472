use std::sync::Arc;
use tracing::debug;

use eplc_core::error::{Error, Result};
use eplc_core::traits::LanguageModel;

use crate::prompts;

/// Report text returned when the input covers the template.
pub const NOTHING_MISSING: &str = "No major missing elements.";

/// Compares user input against retrieved template guidance.
pub struct CompletenessChecker {
    model: Arc<dyn LanguageModel>,
}

impl CompletenessChecker {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Bullet list of missing elements, or [`NOTHING_MISSING`].
    pub async fn check(&self, template_context: &str, user_input: &str) -> Result<String> {
        let report = self
            .model
            .complete(prompts::COMPLETENESS_SYSTEM, &prompts::completeness(template_context, user_input), 0.0)
            .await
            .map_err(|e| match e {
                Error::Synthesis(_) => e,
                other => Error::Synthesis(other.to_string()),
            })?;
        debug!(complete = is_complete(&report), "completeness checked");
        Ok(report)
    }
}

pub fn is_complete(report: &str) -> bool {
    report.trim().trim_matches('"') == NOTHING_MISSING
}
