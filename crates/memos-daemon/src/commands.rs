//! Command implementations for the memos daemon.
//!
//! Handles:
//! - serve: Load config, open the memo file, run the MCP server on stdio
//! - store: Save one memo from the command line
//! - retrieve: Search memos by description and print the matches
//! - list: Print every saved memo

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use memos_search::{ApiGenerator, ApiGeneratorConfig, SearchEngine};
use memos_service::{run_stdio_server_with_shutdown, MemosServer, Retriever};
use memos_storage::{AppendOutcome, MemoStore};
use memos_types::{BuildInfo, Settings};

/// Version data baked in at compile time.
pub fn build_info() -> BuildInfo {
    BuildInfo::new(env!("CARGO_PKG_VERSION"))
        .with_git_commit(option_env!("MEMOS_GIT_COMMIT"))
        .with_build_date(option_env!("MEMOS_BUILD_DATE"))
}

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    store_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(store) = store_override {
        // A path given on the command line is relative to the working directory
        let path = std::path::absolute(store)
            .with_context(|| format!("Invalid store path: {store}"))?;
        settings.store_path = path.to_string_lossy().into_owned();
    }

    Ok(settings)
}

/// Install the global tracing subscriber, logging to stderr.
///
/// stdout carries the MCP transport, so nothing else may write there.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn store_path(settings: &Settings) -> Result<PathBuf> {
    settings
        .resolve_store_path()
        .context("Failed to resolve memo file path")
}

fn open_store(settings: &Settings) -> Result<MemoStore> {
    open_store_at(&store_path(settings)?)
}

fn open_store_at(path: &Path) -> Result<MemoStore> {
    MemoStore::open(path).with_context(|| format!("Failed to open memo file {}", path.display()))
}

fn build_engine(settings: &Settings) -> Result<SearchEngine> {
    let config = ApiGeneratorConfig::from_settings(&settings.generator)
        .context("Failed to configure text generator")?;
    let generator = ApiGenerator::new(config).context("Failed to create text generator")?;
    Ok(SearchEngine::new(Arc::new(generator)).with_max_tokens(settings.generator.max_tokens))
}

fn build_retriever(settings: &Settings, path: &Path) -> Result<Retriever> {
    let engine = build_engine(settings)?;
    let store = open_store_at(path)?;
    Ok(Retriever::new(Arc::new(store), Arc::new(engine)))
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Run the MCP server on stdio.
///
/// 1. Build the text generator (fails without an API token)
/// 2. Open the memo file
/// 3. Serve until the client disconnects or a shutdown signal arrives
pub async fn serve(settings: Settings) -> Result<()> {
    let build = build_info();
    let path = store_path(&settings)?;
    info!("Memos daemon {} starting...", build.long_version());
    info!("Configuration:");
    info!("  Memo file: {}", path.display());
    info!("  Provider: {}", settings.generator.provider);
    info!("  Model: {}", settings.generator.model);
    info!("  Log level: {}", settings.log_level);

    let retriever = Arc::new(build_retriever(&settings, &path)?);
    let server = MemosServer::new(retriever, build);

    let result = run_stdio_server_with_shutdown(server, shutdown_signal()).await;
    result.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

/// Save one memo and print where it went.
pub fn store_memo(settings: &Settings, description: &str, content: &str) -> Result<AppendOutcome> {
    let store = open_store(settings)?;
    let outcome = store
        .append(description, content)
        .context("Failed to save memo")?;

    match &outcome {
        AppendOutcome::Stored(memo) => {
            println!("Saved memo {} to {}", memo.id, store.path().display())
        }
        AppendOutcome::Duplicate { existing_id } => println!(
            "Content already saved as memo {} in {}",
            existing_id,
            store.path().display()
        ),
    }

    store.close().context("Failed to flush memo file")?;
    Ok(outcome)
}

/// Search memos by description and print the matching blocks.
pub async fn retrieve_memo(settings: &Settings, description: &str) -> Result<()> {
    let retriever = build_retriever(settings, &store_path(settings)?)?;
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        canceller.cancel();
    });

    let answer = retriever
        .retrieve(description, &cancel)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if answer.is_empty() {
        println!("No memo found");
    } else {
        print!("{answer}");
    }
    Ok(())
}

/// Print every saved memo in id order.
pub fn list_memos(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    let corpus = store.render_corpus().context("Failed to read memos")?;
    if corpus.is_empty() {
        println!("No memos saved in {}", store.path().display());
    } else {
        print!("{corpus}");
    }
    Ok(())
}
