//! Review loop over one drafted section.
//!
//! A [`Session`] is created in `Initial`, moves to `Review` after the first
//! successful draft and ends in `Accepted`. Regenerate and refine reuse the
//! context fixed by the first draft. Any failed transition leaves the session
//! untouched.

use tracing::info;

use eplc_core::error::{Error, Result};
use eplc_core::types::Phase;

use crate::assistant::Assistant;
use crate::context::FusedContext;
use crate::request::DraftRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initial,
    Review,
    Accepted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    request: DraftRequest,
    context: FusedContext,
    best_similarity: f32,
    draft: String,
    missing_report: String,
    used_fallback_augmentation: bool,
    revisions: u32,
    state: SessionState,
}

impl Session {
    pub fn new(request: DraftRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            request,
            context: FusedContext::default(),
            best_similarity: 0.0,
            draft: String::new(),
            missing_report: String::new(),
            used_fallback_augmentation: false,
            revisions: 0,
            state: SessionState::Initial,
        })
    }

    pub fn request(&self) -> &DraftRequest {
        &self.request
    }

    pub fn context(&self) -> &FusedContext {
        &self.context
    }

    pub fn best_similarity(&self) -> f32 {
        self.best_similarity
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn missing_report(&self) -> &str {
        &self.missing_report
    }

    pub fn used_fallback_augmentation(&self) -> bool {
        self.used_fallback_augmentation
    }

    /// Regenerations and refinements applied since the first draft.
    pub fn revisions(&self) -> u32 {
        self.revisions
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn expect_state(&self, wanted: SessionState, action: &str) -> Result<()> {
        if self.state == wanted {
            return Ok(());
        }
        Err(Error::InvalidState(format!("cannot {action} a session in {:?} state", self.state)))
    }
}

/// A section the user accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedSection {
    pub phase: Phase,
    pub template: String,
    pub section: String,
    pub text: String,
    pub missing_report: String,
}

/// Drives [`Session`] transitions against an [`Assistant`].
pub struct SessionLoop<'a> {
    assistant: &'a Assistant,
}

impl<'a> SessionLoop<'a> {
    pub fn new(assistant: &'a Assistant) -> Self {
        Self { assistant }
    }

    /// Retrieves context once, drafts, and checks completeness.
    pub async fn start(&self, session: &mut Session) -> Result<()> {
        session.expect_state(SessionState::Initial, "start")?;
        let outcome = self.assistant.generate_draft(&session.request).await?;
        let missing = self
            .assistant
            .check_completeness(&outcome.context.render(), &session.request.details)
            .await?;
        session.context = outcome.context;
        session.best_similarity = outcome.best_similarity;
        session.draft = outcome.draft;
        session.used_fallback_augmentation = outcome.used_fallback_augmentation;
        session.missing_report = missing;
        session.state = SessionState::Review;
        Ok(())
    }

    pub async fn regenerate(&self, session: &mut Session) -> Result<()> {
        session.expect_state(SessionState::Review, "regenerate")?;
        let draft = self.assistant.regenerate_draft(&session.request, &session.context).await?;
        self.replace_draft(session, draft).await
    }

    pub async fn refine(&self, session: &mut Session, instructions: &str) -> Result<()> {
        session.expect_state(SessionState::Review, "refine")?;
        if instructions.trim().is_empty() {
            return Err(Error::InvalidInput("follow-up instructions are empty".into()));
        }
        let draft = self.assistant.refine_draft(&session.context, &session.draft, instructions).await?;
        self.replace_draft(session, draft).await
    }

    async fn replace_draft(&self, session: &mut Session, draft: String) -> Result<()> {
        let missing = self
            .assistant
            .check_completeness(&session.context.render(), &session.request.details)
            .await?;
        session.draft = draft;
        session.missing_report = missing;
        session.revisions += 1;
        info!(section = %session.request.section, revisions = session.revisions, "draft revised");
        Ok(())
    }

    pub fn accept(&self, session: &mut Session) -> Result<AcceptedSection> {
        session.expect_state(SessionState::Review, "accept")?;
        session.state = SessionState::Accepted;
        Ok(AcceptedSection {
            phase: session.request.phase,
            template: session.request.template.clone(),
            section: session.request.section.clone(),
            text: session.draft.clone(),
            missing_report: session.missing_report.clone(),
        })
    }

    /// Discards the session and everything retrieved for it.
    pub fn restart(&self, session: Session) {
        info!(section = %session.request.section, state = ?session.state, "session discarded");
    }
}

/// Accepted sections of one template, in drafting order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    phase: Phase,
    template: String,
    sections: Vec<AcceptedSection>,
}

impl DocumentDraft {
    pub fn new(phase: Phase, template: impl Into<String>) -> Self {
        Self { phase, template: template.into(), sections: Vec::new() }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn sections(&self) -> &[AcceptedSection] {
        &self.sections
    }

    /// Adds a section, replacing an earlier acceptance of the same name.
    pub fn add(&mut self, section: AcceptedSection) -> Result<()> {
        if section.phase != self.phase || section.template.trim() != self.template.trim() {
            return Err(Error::InvalidInput(format!(
                "section '{}' belongs to {} / {}, not {} / {}",
                section.section, section.phase, section.template, self.phase, self.template
            )));
        }
        match self.sections.iter_mut().find(|s| s.section == section.section) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("## {}\n\n{}", s.section.trim(), s.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(section: &str, text: &str) -> AcceptedSection {
        AcceptedSection {
            phase: Phase::Design,
            template: "System Design Document".into(),
            section: section.into(),
            text: text.into(),
            missing_report: String::new(),
        }
    }

    #[test]
    fn new_session_starts_initial_and_rejects_blank_fields() {
        let s = Session::new(DraftRequest::new(Phase::Design, "SDD", "Scope", "details")).unwrap();
        assert_eq!(s.state(), SessionState::Initial);
        assert!(s.context().is_empty());
        assert!(Session::new(DraftRequest::new(Phase::Design, "SDD", "Scope", "")).is_err());
    }

    #[test]
    fn document_draft_replaces_reaccepted_sections() {
        let mut doc = DocumentDraft::new(Phase::Design, "System Design Document");
        doc.add(accepted("Scope", "v1")).unwrap();
        doc.add(accepted("Security", "locked down")).unwrap();
        doc.add(accepted("Scope", "v2")).unwrap();
        assert_eq!(doc.sections().len(), 2);
        assert_eq!(doc.render(), "## Scope\n\nv2\n\n## Security\n\nlocked down");
    }

    #[test]
    fn document_draft_rejects_foreign_sections() {
        let mut doc = DocumentDraft::new(Phase::Requirement, "Requirements Document");
        assert!(matches!(doc.add(accepted("Scope", "x")), Err(Error::InvalidInput(_))));
    }
}
