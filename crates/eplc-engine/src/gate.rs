//! Confidence decisions for answers and drafts.

use crate::context::FusedContext;

/// Answer returned when nothing relevant was retrieved, and the marker the
/// context-bound model emits when the context cannot answer.
pub const REFUSAL: &str = "Not specified in the provided context.";

/// Appended verbatim to low-confidence drafts.
pub const AUGMENTATION_CHECKLIST: &str = "\n\nAssumptions & Next Steps:\n\
- Confirm data categories and user groups.\n\
- Validate environmental dependencies.\n\
- List technical or security risks.\n\
- Identify owner responsibilities.\n";

/// Drafts are augmented when the best similarity falls below this share of `min_sim`.
pub const AUGMENTATION_FACTOR: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceDecision {
    /// Answer strictly from the fused context.
    ContextBound,
    /// Nothing retrieved: refuse without calling the model.
    Refuse,
    /// Context was present but insufficient: answer from general knowledge.
    Fallback,
}

impl ConfidenceDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceDecision::ContextBound => "context_bound",
            ConfidenceDecision::Refuse => "refuse",
            ConfidenceDecision::Fallback => "fallback",
        }
    }
}

pub fn decide(context: &FusedContext) -> ConfidenceDecision {
    if context.is_empty() { ConfidenceDecision::Refuse } else { ConfidenceDecision::ContextBound }
}

pub fn is_refusal(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(REFUSAL)
}

/// Decision after the context-bound answer is known.
pub fn reassess(context_bound_answer: &str) -> ConfidenceDecision {
    if is_refusal(context_bound_answer) { ConfidenceDecision::Fallback } else { ConfidenceDecision::ContextBound }
}

pub fn needs_augmentation(best_similarity: f32, min_similarity: f32) -> bool {
    best_similarity < AUGMENTATION_FACTOR * min_similarity
}

pub fn augment(mut draft: String) -> String {
    draft.push_str(AUGMENTATION_CHECKLIST);
    draft
}
