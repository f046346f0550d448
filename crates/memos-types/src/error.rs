//! Error types for the agent-memos system.

use thiserror::Error;

/// Unified error type for settings and startup.
#[derive(Debug, Error)]
pub enum MemosError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
