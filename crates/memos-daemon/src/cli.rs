//! CLI argument parsing for the memos daemon.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Agent Memos Daemon
///
/// Save text with a description, find it again by describing it.
#[derive(Parser, Debug)]
#[command(name = "memos-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (in addition to ~/.config/agent-memos/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve {
        /// Override memo file path
        #[arg(long)]
        store: Option<String>,
    },

    /// Save a memo
    Store {
        /// What the content is, used later to find it
        description: String,

        /// Text to save
        content: String,

        /// Override memo file path
        #[arg(long)]
        store: Option<String>,
    },

    /// Find memos matching a description and print them
    Retrieve {
        /// Description of the memo you are looking for
        description: String,

        /// Override memo file path
        #[arg(long)]
        store: Option<String>,
    },

    /// Print every saved memo
    List {
        /// Override memo file path
        #[arg(long)]
        store: Option<String>,
    },
}
