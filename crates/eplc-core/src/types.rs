//! Domain types shared by stores, retriever and synthesis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type FragmentId = String;

/// Converts a store distance into a similarity score.
///
/// Returns `1.0 - distance` for a finite distance and `0.0` otherwise, so an
/// exact-match fragment (no distance) or a corrupt value never fails.
pub fn similarity(distance: Option<f32>) -> f32 {
    match distance {
        Some(d) if d.is_finite() => 1.0 - d,
        _ => 0.0,
    }
}

/// Indicates which lookup produced a fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Exact,
    Semantic,
}

/// A single retrieved unit of text.
///
/// - `id`: unique within its store
/// - `text`: the fragment payload injected into prompts
/// - `distance`: present only for vector results, lower is closer
/// - `store`: label of the store that returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub text: String,
    pub distance: Option<f32>,
    pub store: String,
}

impl Fragment {
    pub fn exact(id: impl Into<String>, text: impl Into<String>, store: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), distance: None, store: store.into() }
    }

    pub fn semantic(
        id: impl Into<String>,
        text: impl Into<String>,
        distance: f32,
        store: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), text: text.into(), distance: Some(distance), store: store.into() }
    }

    pub fn source(&self) -> SourceKind {
        if self.distance.is_some() { SourceKind::Semantic } else { SourceKind::Exact }
    }

    pub fn similarity(&self) -> f32 {
        similarity(self.distance)
    }

    /// Positional score reported alongside ids and docs: the raw distance for
    /// semantic hits, `0.0` for exact hits.
    pub fn score(&self) -> f32 {
        self.distance.unwrap_or(0.0)
    }
}

/// Ordered hits of one retrieval call.
///
/// Ids, docs and scores are projections of the same fragment list, so they
/// always have equal length and matching order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    fragments: Vec<Fragment>,
}

impl RetrievalResult {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn docs(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.fragments.iter().map(Fragment::score).collect()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    /// Highest similarity among the hits, `0.0` when there are none.
    pub fn best_similarity(&self) -> f32 {
        if self.fragments.is_empty() {
            return 0.0;
        }
        self.fragments.iter().map(Fragment::similarity).fold(f32::NEG_INFINITY, f32::max)
    }
}

impl FromIterator<Fragment> for RetrievalResult {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self { fragments: iter.into_iter().collect() }
    }
}

impl IntoIterator for RetrievalResult {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

/// Enterprise Product Lifecycle phase. Each phase owns a drafting store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Requirement,
    Design,
    Implementation,
    Development,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Requirement, Phase::Design, Phase::Implementation, Phase::Development];

    /// Lowercase key used in configuration.
    pub fn key(self) -> &'static str {
        match self {
            Phase::Requirement => "requirement",
            Phase::Design => "design",
            Phase::Implementation => "implementation",
            Phase::Development => "development",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Phase::Requirement => "Requirement",
            Phase::Design => "Design",
            Phase::Implementation => "Implementation",
            Phase::Development => "Development",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Phase::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown phase '{wanted}', expected one of: Requirement / Design / Implementation / Development"
                ))
            })
    }
}
