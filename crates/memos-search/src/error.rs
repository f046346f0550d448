//! Search error types.

use thiserror::Error;

use crate::generator::GeneratorError;

/// Errors returned by [`crate::SearchEngine::search`].
///
/// Parse failures get their own variants so callers can tell "nothing
/// matched" apart from "the answer could not be understood".
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend call itself failed
    #[error("LLM error: {0}")]
    Llm(#[source] GeneratorError),

    /// The backend returned no candidate output
    #[error("Empty response from model")]
    EmptyResponse,

    /// The answer contained no memo id at all
    #[error("No matching memo id in model response")]
    NoMatch,

    /// The disambiguation answer had no usable bracketed id list
    #[error("Could not parse id list from model response: {0}")]
    AmbiguousParse(String),

    /// The caller cancelled the request
    #[error("Search cancelled")]
    Cancelled,
}

impl From<GeneratorError> for SearchError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::EmptyResponse => SearchError::EmptyResponse,
            other => SearchError::Llm(other),
        }
    }
}
