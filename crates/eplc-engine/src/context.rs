use eplc_core::types::{Fragment, RetrievalResult};

/// Joins fragment texts when rendering a context.
pub const SEPARATOR: &str = "\n\n---\n\n";
/// Rendering of a context with no fragments.
pub const NO_MATCHES: &str = "(no strong matches)";

/// Fragments selected for one synthesis: exact hits first, then the filtered
/// semantic hits. Duplicates across the two paths are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusedContext {
    fragments: Vec<Fragment>,
}

impl FusedContext {
    pub fn fuse(exact: RetrievalResult, semantic: RetrievalResult) -> Self {
        let mut fragments = exact.into_fragments();
        fragments.extend(semantic);
        Self { fragments }
    }

    pub fn from_semantic(semantic: RetrievalResult) -> Self {
        Self { fragments: semantic.into_fragments() }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn citation_ids(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.id.clone()).collect()
    }

    pub fn render(&self) -> String {
        if self.fragments.is_empty() {
            return NO_MATCHES.to_string();
        }
        self.fragments.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join(SEPARATOR)
    }
}
