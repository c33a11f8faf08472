use eplc_core::error::{Error, Result};
use eplc_core::types::Phase;

/// What the user asked to have drafted.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRequest {
    pub phase: Phase,
    pub template: String,
    pub section: String,
    /// Product or context description supplied by the user.
    pub details: String,
    /// Extra drafting instructions; the word band is used when absent.
    pub instructions: Option<String>,
}

impl DraftRequest {
    pub fn new(
        phase: Phase,
        template: impl Into<String>,
        section: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            template: template.into(),
            section: section.into(),
            details: details.into(),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = if instructions.trim().is_empty() { None } else { Some(instructions) };
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("template", &self.template), ("section", &self.section), ("details", &self.details)] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// Text embedded to query the phase store.
    pub fn query_text(&self) -> String {
        format!(
            "{} Phase | Template: {} | Section: {}\n{}",
            self.phase.title(),
            self.template.trim(),
            self.section.trim(),
            self.details.trim()
        )
    }

    pub fn instructions_or_default(&self, min_words: usize, max_words: usize) -> String {
        match &self.instructions {
            Some(i) => i.trim().to_string(),
            None => format!("Concise, specific, {min_words}-{max_words} words."),
        }
    }
}
