//! eplc-engine
//!
//! Retrieval, confidence gating and synthesis for EPLC question answering and
//! section drafting. Everything external (stores, embedders, the language
//! model) arrives through the capability traits in `eplc_core::traits`.

pub mod assistant;
pub mod completeness;
pub mod context;
pub mod conversation;
pub mod gate;
pub mod prompts;
pub mod request;
pub mod retriever;
pub mod session;
pub mod synthesizer;

pub use assistant::{Answer, Assistant, AssistantBuilder, DraftOutcome};
pub use completeness::CompletenessChecker;
pub use context::FusedContext;
pub use conversation::{Conversation, Exchange};
pub use gate::ConfidenceDecision;
pub use request::DraftRequest;
pub use retriever::{filter_by_threshold, Retriever, Threshold};
pub use session::{AcceptedSection, DocumentDraft, Session, SessionLoop, SessionState};
pub use synthesizer::{SystemPolicy, Synthesizer};
