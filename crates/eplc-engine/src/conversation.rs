use tracing::debug;

use eplc_core::error::{Error, Result};

use crate::assistant::Assistant;
use crate::gate::ConfidenceDecision;

/// One answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub citations: Vec<String>,
    pub decision: ConfidenceDecision,
}

/// Question-answering history. Each question is answered independently; the
/// history is kept for display only.
pub struct Conversation<'a> {
    assistant: &'a Assistant,
    exchanges: Vec<Exchange>,
}

impl<'a> Conversation<'a> {
    pub fn new(assistant: &'a Assistant) -> Self {
        Self { assistant, exchanges: Vec::new() }
    }

    /// Answers `question` and records the exchange. Failed turns are not recorded.
    pub async fn ask(&mut self, question: &str) -> Result<&Exchange> {
        let answer = self.assistant.answer_question(question).await?;
        self.exchanges.push(Exchange {
            question: question.trim().to_string(),
            answer: answer.text,
            citations: answer.citations,
            decision: answer.decision,
        });
        debug!(turns = self.exchanges.len(), "exchange recorded");
        self.exchanges.last().ok_or_else(|| Error::InvalidState("conversation history is empty".into()))
    }

    pub fn restart(&mut self) {
        self.exchanges.clear();
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }
}
