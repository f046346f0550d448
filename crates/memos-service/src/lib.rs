//! Tool service for agent-memos.
//!
//! Provides:
//! - `Retriever`: store + search engine, answering "which memos match"
//! - `MemosServer`: MCP tool server exposing storeMemo, retrieveMemo and
//!   repeat, plus the add_memo_prompt prompt
//! - `run_stdio_server`: serve the tools over stdin/stdout

pub mod retrieval;
pub mod server;
pub mod tools;

pub use retrieval::{RetrieveError, Retriever};
pub use server::{run_stdio_server, run_stdio_server_with_shutdown, MemosServer};
