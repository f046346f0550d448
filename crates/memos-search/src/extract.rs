//! Memo id extraction from free-form model answers.
//!
//! Two stages with different grammars:
//! - [`extract_candidates`]: every bare integer in the text
//! - [`extract_bracketed`]: the first `[...]` span decoded as a JSON id array

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SearchError;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid regex"));

/// Every maximal run of ASCII digits, left to right, as `u64`.
///
/// Runs too large for `u64` are skipped.
pub fn extract_candidates(text: &str) -> Vec<u64> {
    DIGIT_RUN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .collect()
}

/// Decode the first bracketed span as a list of ids.
///
/// The span runs from the first `[` to the nearest following `]`.
pub fn extract_bracketed(text: &str) -> Result<Vec<u64>, SearchError> {
    let span = BRACKETED
        .find(text)
        .ok_or_else(|| SearchError::AmbiguousParse("no bracketed list in response".to_string()))?;

    serde_json::from_str(span.as_str()).map_err(|e| {
        SearchError::AmbiguousParse(format!("invalid id list {}: {}", span.as_str(), e))
    })
}
