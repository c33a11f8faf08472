#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use eplc_core::config::Settings;
use eplc_core::error::{Error, Result};
use eplc_core::traits::{Embedder, KnowledgeStore, LanguageModel};
use eplc_core::types::Fragment;
use eplc_embed::FakeEmbedder;
use eplc_engine::Assistant;

#[derive(Debug, Clone)]
pub struct Call {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

pub enum Reply {
    Text(String),
    Fail(String),
}

/// Language model replaying queued replies and recording every call.
/// When the queue is empty it answers "scripted answer N".
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::default();
        model.replies.lock().unwrap().extend(replies.into_iter().map(|r| Reply::Text(r.into())));
        Arc::new(model)
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call { system: system.to_string(), user: user.to_string(), temperature });
            calls.len()
        };
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(t)) => Ok(t),
            Some(Reply::Fail(msg)) => Err(Error::Synthesis(msg)),
            None => Ok(format!("scripted answer {n}")),
        }
    }
}

/// Store returning preset fragments regardless of the query vector.
pub struct FixedStore {
    label: String,
    fragments: Vec<(String, String, f32)>,
}

impl FixedStore {
    pub fn new(label: &str) -> Self {
        Self { label: label.to_string(), fragments: Vec::new() }
    }

    pub fn with(mut self, id: &str, text: &str, distance: f32) -> Self {
        self.fragments.push((id.to_string(), text.to_string(), distance));
        self
    }

    pub fn shared(self) -> Arc<dyn KnowledgeStore> {
        Arc::new(self)
    }
}

#[async_trait]
impl KnowledgeStore for FixedStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn exact_lookup(&self, substring: &str, limit: usize) -> Result<Vec<Fragment>> {
        Ok(self
            .fragments
            .iter()
            .filter(|(_, text, _)| text.contains(substring))
            .take(limit)
            .map(|(id, text, _)| Fragment::exact(id, text, &self.label))
            .collect())
    }

    async fn vector_lookup(&self, _query: &[f32], k: usize) -> Result<Vec<Fragment>> {
        let mut hits: Vec<Fragment> = self
            .fragments
            .iter()
            .map(|(id, text, d)| Fragment::semantic(id, text, *d, &self.label))
            .collect();
        hits.sort_by(|a, b| a.score().total_cmp(&b.score()));
        hits.truncate(k);
        Ok(hits)
    }
}

pub struct FailingStore(pub &'static str);

#[async_trait]
impl KnowledgeStore for FailingStore {
    fn label(&self) -> &str {
        self.0
    }

    async fn exact_lookup(&self, _substring: &str, _limit: usize) -> Result<Vec<Fragment>> {
        Err(Error::store_unavailable(self.0, "connection refused"))
    }

    async fn vector_lookup(&self, _query: &[f32], _k: usize) -> Result<Vec<Fragment>> {
        Err(Error::store_unavailable(self.0, "connection refused"))
    }
}

/// Wraps the hash embedder, counting calls and optionally failing them.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    fail: bool,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self { inner: FakeEmbedder::new(8), fail: false, calls: AtomicUsize::new(0) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { inner: FakeEmbedder::new(8), fail: true, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("model offline".into()));
        }
        self.inner.embed(text).await
    }
}

pub struct Fixture {
    pub qa_stores: Vec<Arc<dyn KnowledgeStore>>,
    pub phase_stores: Vec<(eplc_core::types::Phase, Arc<dyn KnowledgeStore>)>,
    pub embedder: Arc<CountingEmbedder>,
    pub model: Arc<ScriptedModel>,
}

impl Fixture {
    pub fn new(model: Arc<ScriptedModel>) -> Self {
        Self { qa_stores: Vec::new(), phase_stores: Vec::new(), embedder: CountingEmbedder::ok(), model }
    }

    pub fn assistant(&self) -> Assistant {
        let mut builder = Assistant::builder(&Settings::default())
            .qa_embedder(self.embedder.clone())
            .drafting_embedder(self.embedder.clone())
            .model(self.model.clone());
        for store in &self.qa_stores {
            builder = builder.qa_store(Arc::clone(store));
        }
        for (phase, store) in &self.phase_stores {
            builder = builder.phase_store(*phase, Arc::clone(store));
        }
        builder.build().unwrap()
    }
}
