//! Memos daemon library exports.
//!
//! This crate provides the CLI binary for agent-memos.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (serve, store, retrieve, list)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    build_info, init_logging, list_memos, load_settings, retrieve_memo, serve, store_memo,
};
