//! eplc-llm
//!
//! Language-model adapters behind `eplc_core::traits::LanguageModel`.

pub mod openai;

pub use openai::OpenAiChat;
