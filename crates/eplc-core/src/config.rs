//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys split on `__`, e.g. `APP_RETRIEVAL__TOP_K`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Phase;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Loads configuration for the environment named by `RUST_ENV` (default `dev`).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment =
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Configuration(format!("failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Every tunable the engine and its adapters read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub openai: OpenAiSettings,
    pub stores: StoreSettings,
    pub local_embedder: LocalEmbedderSettings,
    /// Swap both embedders for the deterministic hash embedder.
    pub use_fake_embeddings: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        for (name, value) in [
            ("retrieval.sim_filter", r.sim_filter),
            ("retrieval.min_sim", r.min_sim),
            ("retrieval.sem_threshold", r.sem_threshold),
            ("generation.drafting_temperature", self.generation.drafting_temperature),
            ("generation.answer_temperature", self.generation.answer_temperature),
        ] {
            if !value.is_finite() {
                return Err(Error::Configuration(format!("{name} must be a finite number")));
            }
        }
        let g = &self.generation;
        if g.target_min_words > g.target_max_words {
            return Err(Error::Configuration(format!(
                "generation.target_min_words ({}) exceeds generation.target_max_words ({})",
                g.target_min_words, g.target_max_words
            )));
        }
        if self.openai.embedding_dimensions == 0 {
            return Err(Error::Configuration("openai.embedding_dimensions must be positive".into()));
        }
        Ok(())
    }

    /// API credential from `openai.api_key`, falling back to `OPENAI_API_KEY`.
    pub fn api_key(&self) -> Result<String> {
        let configured = self.openai.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
        if let Some(key) = configured {
            return Ok(key.to_string());
        }
        env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Configuration("OPENAI_API_KEY missing (set openai.api_key or OPENAI_API_KEY)".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Fan-out size k, applied per store and to the merged result.
    pub top_k: usize,
    /// Drafting keep-threshold on similarity (keep when `>=`).
    pub sim_filter: f32,
    /// Drafting confidence floor; drafts are augmented below `0.75 * min_sim`.
    pub min_sim: f32,
    /// Q&A cutoff on raw distance (keep when `<`).
    pub sem_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 6, sim_filter: 0.45, min_sim: 0.35, sem_threshold: 0.75 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub chat_model: String,
    pub target_min_words: usize,
    pub target_max_words: usize,
    pub drafting_temperature: f32,
    pub answer_temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            target_min_words: 120,
            target_max_words: 180,
            drafting_temperature: 0.2,
            answer_temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            embedding_model: "text-embedding-3-large".to_string(),
            embedding_dimensions: 1024,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding one LanceDB database per store.
    pub root: String,
    pub eplc: String,
    pub hhs: String,
    /// Table to open in every database; when unset the single table present is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub phases: PhaseStores,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: "vector_db".to_string(),
            eplc: "EPLCFramework_db".to_string(),
            hhs: "HHS_db".to_string(),
            table: None,
            phases: PhaseStores::default(),
        }
    }
}

impl StoreSettings {
    pub fn root_dir(&self) -> PathBuf {
        expand_path(&self.root)
    }

    /// `(label, location)` of the question-answering stores, in query order.
    /// A blank name leaves that store unconfigured.
    pub fn qa_locations(&self) -> Vec<(String, PathBuf)> {
        let root = self.root_dir();
        [&self.eplc, &self.hhs]
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| (name.clone(), resolve_with_base(&root, name)))
            .collect()
    }

    pub fn phase_location(&self, phase: Phase) -> (String, PathBuf) {
        let name = self.phases.name(phase);
        (name.to_string(), resolve_with_base(&self.root_dir(), name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseStores {
    pub requirement: String,
    pub design: String,
    pub implementation: String,
    pub development: String,
}

impl Default for PhaseStores {
    fn default() -> Self {
        Self {
            requirement: "Requirement_db".to_string(),
            design: "Design_db".to_string(),
            implementation: "Implementation_db".to_string(),
            development: "Development_db".to_string(),
        }
    }
}

impl PhaseStores {
    pub fn name(&self, phase: Phase) -> &str {
        match phase {
            Phase::Requirement => &self.requirement,
            Phase::Design => &self.design,
            Phase::Implementation => &self.implementation,
            Phase::Development => &self.development,
        }
    }
}

/// How token states collapse into one sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// First-token state; what BGE models are trained for.
    #[default]
    Cls,
    /// Attention-masked mean over tokens.
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalEmbedderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub dimension: usize,
    /// Prepended to every query before encoding.
    pub query_prefix: String,
    pub pooling: Pooling,
}

impl Default for LocalEmbedderSettings {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_len: 512,
            dimension: 1024,
            query_prefix: "query: ".to_string(),
            pooling: Pooling::default(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
