//! # memos-types
//!
//! Shared domain types for the agent-memos system.
//!
//! - `Memo`: an immutable (id, description, content) note
//! - `Settings`: layered configuration for the daemon and the backend
//! - `BuildInfo`: version data handed to the tool server at startup
//!
//! ## Usage
//!
//! ```rust
//! use memos_types::Memo;
//!
//! let memo = Memo::new(1, "api key for staging", "sk-123");
//! assert!(memo.to_string().contains("sk-123"));
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod memo;

pub use build::BuildInfo;
pub use config::{GeneratorSettings, Settings};
pub use error::MemosError;
pub use memo::{strip_whitespace, Memo};
