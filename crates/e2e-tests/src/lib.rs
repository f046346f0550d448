//! End-to-end test infrastructure for agent-memos.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full store-to-retrieve flow.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::model::CallToolResult;

use memos_search::{ScriptedGenerator, ScriptedReply, SearchEngine, TextGenerator};
use memos_service::{MemosServer, Retriever};
use memos_storage::MemoStore;
use memos_types::BuildInfo;

/// Shared test harness for E2E tests.
///
/// Owns a temporary memo file and wires a retriever over it with whatever
/// generator the test supplies.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Location of the memo file
    pub store_path: PathBuf,
    /// Shared memo store
    pub store: Arc<MemoStore>,
}

impl TestHarness {
    /// Create a new test harness with an empty memo file.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let store_path = temp_dir.path().join("memos.json");
        let store = Arc::new(MemoStore::open(&store_path).expect("Failed to open test store"));

        Self {
            _temp_dir: temp_dir,
            store_path,
            store,
        }
    }

    /// Retriever over this harness's store backed by `generator`.
    pub fn retriever(&self, generator: Arc<dyn TextGenerator>) -> Arc<Retriever> {
        let engine = Arc::new(SearchEngine::new(generator));
        Arc::new(Retriever::new(self.store.clone(), engine))
    }

    /// Retriever whose model answers with `replies` in order.
    pub fn scripted(&self, replies: Vec<ScriptedReply>) -> (Arc<Retriever>, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(replies));
        (self.retriever(generator.clone()), generator)
    }

    /// Tool server over a scripted retriever.
    pub fn server(&self, replies: Vec<ScriptedReply>) -> (MemosServer, Arc<ScriptedGenerator>) {
        let (retriever, generator) = self.scripted(replies);
        let server = MemosServer::new(retriever, BuildInfo::new("0.0.0-test"));
        (server, generator)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Store each `(description, content)` pair in order.
pub fn seed_memos(store: &MemoStore, memos: &[(&str, &str)]) {
    for (description, content) in memos {
        store
            .append(*description, *content)
            .expect("Failed to seed memo");
    }
}

/// Plain-text replies for a scripted generator.
pub fn replies(texts: &[&str]) -> Vec<ScriptedReply> {
    texts
        .iter()
        .map(|t| ScriptedReply::Text(t.to_string()))
        .collect()
}

/// Text of the first content item of a tool result.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}
