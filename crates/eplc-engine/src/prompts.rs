//! System policies and user-prompt builders.

use crate::request::DraftRequest;

pub const CONTEXT_BOUND_SYSTEM: &str = "You are an EPLC/HHS domain assistant. \
Answer ONLY using information in the CONTEXT. \
If the CONTEXT cannot answer the question, reply exactly: Not specified in the provided context.";

pub const FALLBACK_SYSTEM: &str = "You are a general expert assistant. \
Give a correct and helpful answer using general knowledge. \
DO NOT reference or imply context. DO NOT hallucinate context.";

pub const PHASE_GUIDE_SYSTEM: &str = "You are an EPLC (Enterprise Product Lifecycle) assistant.
Answer questions based on the provided context from EPLC documentation and policies.
Be concise, accurate, and professional.";

pub const COMPLETENESS_SYSTEM: &str = "You check completeness of input vs template.";

pub fn drafting_system(min_words: usize, max_words: usize) -> String {
    format!(
        "You are an assistant that drafts paste-ready text for a chosen phase of the Enterprise Product Lifecycle (EPLC).
Each vector database corresponds to a specific phase (Requirement, Design, Implementation, or Development).
Use the phase, template, and section to stay in scope.
Be concise, specific, and professional ({min_words}-{max_words} words)."
    )
}

/// Wraps an instruction with its context block.
pub fn with_context(context: &str, instruction: &str) -> String {
    format!("CONTEXT:\n{context}\n\n{instruction}")
}

pub fn question(question: &str) -> String {
    format!("QUESTION:\n{question}\n")
}

pub fn phase_question(question: &str) -> String {
    format!("QUESTION:\n{question}\n\nPlease provide a clear and helpful answer based on the context above.\n")
}

pub fn initial_draft(request: &DraftRequest, min_words: usize, max_words: usize) -> String {
    format!(
        "QUESTION:\nDraft the {section} section for the {template} in the {phase} Phase.\n\n\
         User details:\n{details}\n\n\
         Instructions:\n{instructions}\n",
        section = request.section.trim(),
        template = request.template.trim(),
        phase = request.phase.title(),
        details = request.details.trim(),
        instructions = request.instructions_or_default(min_words, max_words),
    )
}

pub fn regenerate(request: &DraftRequest, min_words: usize, max_words: usize) -> String {
    format!(
        "TASK:\nRegenerate the entire {section} section for the {template} in the {phase} Phase,\n\
         using the same user details. Produce a clearly different, improved version.\n\
         Keep {min_words}-{max_words} words.\n\n\
         User details:\n{details}\n",
        section = request.section.trim(),
        template = request.template.trim(),
        phase = request.phase.title(),
        details = request.details.trim(),
    )
}

pub fn refine(current_draft: &str, follow_up: &str) -> String {
    format!(
        "CURRENT DRAFT:\n{current_draft}\n\n\
         FOLLOW-UP INSTRUCTIONS:\n{follow}\n\n\
         TASK:\nRegenerate the entire section with meaningful updates that fully reflect the new instructions.\n",
        follow = follow_up.trim(),
    )
}

pub fn completeness(template_context: &str, user_input: &str) -> String {
    format!(
        "You are an EPLC completeness checker.\n\n\
         TEMPLATE CONTEXT (EPLC guidance from vector DB):\n{template_context}\n\n\
         USER INPUT:\n{user_input}\n\n\
         TASK:\n\
         1. Identify key EPLC-required elements implied by TEMPLATE CONTEXT.\n\
         2. Check which elements are missing from USER INPUT.\n\
         3. Return a bullet list of missing items.\n\
         4. If nothing is missing, return exactly: \"No major missing elements.\"\n"
    )
}
