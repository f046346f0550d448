//! Memo record.
//!
//! A memo is the unit of stored knowledge: an id assigned by the store,
//! a free-text description used for matching, and the remembered content.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored note.
///
/// Memos are created only by the store and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    /// Store-assigned identifier, unique within a store
    pub id: u64,

    /// Label used by the model to decide whether the memo matches a query
    pub description: String,

    /// The remembered payload
    pub content: String,
}

impl Memo {
    pub fn new(id: u64, description: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            content: content.into(),
        }
    }

    /// Content with every whitespace character removed.
    ///
    /// Two memos whose normalized content is equal are duplicates.
    pub fn normalized_content(&self) -> String {
        strip_whitespace(&self.content)
    }
}

/// Renders the block handed to the model and returned to tool callers.
impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: `{}`\ndescription: `{}`\ncontent: ```\n{}\n```\n\n ------------ \n\n",
            self.id, self.description, self.content
        )
    }
}

/// Remove all whitespace characters from a string.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
