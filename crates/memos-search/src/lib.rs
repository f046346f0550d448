//! LLM-assisted memo search for agent-memos.
//!
//! Provides:
//! - `TextGenerator`: pluggable text-completion backend (HTTP API or scripted)
//! - Candidate extraction from free-form model answers
//! - `SearchEngine`: query -> memo ids, with a disambiguation round when the
//!   first answer names more than one id

pub mod engine;
pub mod error;
pub mod extract;
pub mod generator;

pub use engine::{SearchEngine, DISAMBIGUATION_PROMPT, SEARCH_PROMPT};
pub use error::SearchError;
pub use extract::{extract_bracketed, extract_candidates};
pub use generator::{
    ApiGenerator, ApiGeneratorConfig, ChatMessage, ChatRole, GeneratorError, Provider, RecordedCall,
    ScriptedGenerator, ScriptedReply, TextGenerator,
};
