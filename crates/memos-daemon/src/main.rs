//! Agent Memos Daemon
//!
//! Saves short text memos with a description and finds them again from a
//! natural-language description, for AI agents speaking MCP.
//!
//! # Usage
//!
//! ```bash
//! memos-daemon serve [--store PATH]
//! memos-daemon store <DESCRIPTION> <CONTENT> [--store PATH]
//! memos-daemon retrieve <DESCRIPTION> [--store PATH]
//! memos-daemon list [--store PATH]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/agent-memos/config.toml)
//! 3. Environment variables (MEMOS_*, plus ANTHROPIC_MODEL, LLM_TOKEN, LLM_BASE_URL)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use memos_daemon::{
    init_logging, list_memos, load_settings, retrieve_memo, serve, store_memo, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store_override = match &cli.command {
        Commands::Serve { store }
        | Commands::Store { store, .. }
        | Commands::Retrieve { store, .. }
        | Commands::List { store } => store.as_deref(),
    };
    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        store_override,
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Serve { .. } => {
            serve(settings).await?;
        }
        Commands::Store {
            description,
            content,
            ..
        } => {
            store_memo(&settings, &description, &content)?;
        }
        Commands::Retrieve { description, .. } => {
            retrieve_memo(&settings, &description).await?;
        }
        Commands::List { .. } => {
            list_memos(&settings)?;
        }
    }

    Ok(())
}
