//! Retrieval façade: memo store plus search engine.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use memos_search::{SearchEngine, SearchError};
use memos_storage::{AppendOutcome, MemoStore, StorageError};

/// Errors from [`Retriever::retrieve`].
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The blocking file task panicked or was aborted
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl RetrieveError {
    /// Message shown to the tool caller.
    pub fn user_message(&self) -> String {
        match self {
            RetrieveError::Storage(e) => format!("Failed to read memos: {e}"),
            RetrieveError::Task(e) => format!("Failed to read memos: {e}"),
            RetrieveError::Search(SearchError::NoMatch) => {
                "No saved memo matches this description".to_string()
            }
            RetrieveError::Search(SearchError::AmbiguousParse(_)) => {
                "Could not understand which memos the model picked, try a more specific description"
                    .to_string()
            }
            RetrieveError::Search(SearchError::Cancelled) => "Retrieval cancelled".to_string(),
            RetrieveError::Search(e) => format!("Cannot retrieve text, error: {e}"),
        }
    }
}

/// Answers "which memo(s) match this description".
pub struct Retriever {
    store: Arc<MemoStore>,
    engine: Arc<SearchEngine>,
}

impl Retriever {
    pub fn new(store: Arc<MemoStore>, engine: Arc<SearchEngine>) -> Self {
        Self { store, engine }
    }

    /// Path of the backing memo file.
    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Save a memo; duplicates are reported but not written.
    pub async fn store(
        &self,
        description: &str,
        content: &str,
    ) -> Result<AppendOutcome, RetrieveError> {
        let description = description.to_string();
        let content = content.to_string();
        self.with_store(move |store| store.append(description, content)).await
    }

    /// Run a file operation off the async runtime.
    async fn with_store<T, F>(&self, op: F) -> Result<T, RetrieveError>
    where
        T: Send + 'static,
        F: FnOnce(&MemoStore) -> Result<T, StorageError> + Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| RetrieveError::Task(e.to_string()))?;
        Ok(result?)
    }

    /// Render the blocks of every memo matching `query`.
    ///
    /// Blocks appear in the order the model returned the ids. Ids that are
    /// not in the store contribute nothing, so the result may be empty.
    pub async fn retrieve(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String, RetrieveError> {
        let corpus = self.with_store(|store| store.render_corpus()).await?;
        let ids = self.engine.search(query, &corpus, cancel).await?;

        let memos = self.with_store(|store| store.read_all()).await?;
        let mut answer = String::new();
        for id in &ids {
            match memos.get(id) {
                Some(memo) => answer.push_str(&memo.to_string()),
                None => debug!(id, "Model returned an unknown memo id"),
            }
        }

        info!(matched = ids.len(), bytes = answer.len(), "Retrieved memos");
        Ok(answer)
    }
}
