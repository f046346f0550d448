//! Storage layer for agent-memos.
//!
//! Provides a JSON-file-backed memo store with:
//! - Whole-file reads on every access (no caching across calls)
//! - Store-assigned, monotonically increasing ids
//! - Whitespace-insensitive duplicate suppression
//! - Full pretty-printed rewrite on every append

pub mod error;
pub mod store;

pub use error::StorageError;
pub use store::{AppendOutcome, MemoStore};
