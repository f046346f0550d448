//! Query -> memo ids via the text generator.
//!
//! The first answer is free-form prose. Exactly one number in it is taken
//! as the answer. More than one number triggers a second, constrained round
//! that asks for a bracketed id array.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use memos_types::config::MAX_GENERATED_TOKENS;

use crate::error::SearchError;
use crate::extract::{extract_bracketed, extract_candidates};
use crate::generator::{ChatMessage, TextGenerator};

/// Instruction sent as the system message. `{memos}` is replaced with the
/// rendered corpus.
pub const SEARCH_PROMPT: &str = r#"You help a user find notes they saved earlier.
Each note below has an id, a description and its content, and notes are separated by dashed lines.

NOTES:
{memos}

The user will describe the note they are looking for.
Reply with the id of the single note that best matches the description.
If several notes match equally well, list the ids of all of them.
If no note matches, say so without writing any number."#;

/// Follow-up user message for the disambiguation round.
pub const DISAMBIGUATION_PROMPT: &str =
    "Answer again using only a JSON array of the matching note ids, for example [3, 9].";

/// LLM-assisted memo search.
pub struct SearchEngine {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl SearchEngine {
    /// Create an engine with the default token budget.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_tokens: MAX_GENERATED_TOKENS,
        }
    }

    /// Override the per-call token budget, capped at the global maximum.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.clamp(1, MAX_GENERATED_TOKENS);
        self
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Find the ids of the memos in `corpus` that match `query`.
    ///
    /// Ids are returned exactly as the model produced them: no dedup, no
    /// reordering and no check that they exist in the store.
    pub async fn search(
        &self,
        query: &str,
        corpus: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u64>, SearchError> {
        let mut messages = vec![
            ChatMessage::system(SEARCH_PROMPT.replace("{memos}", corpus)),
            ChatMessage::user(query),
        ];

        let first = self.call(&messages, cancel).await?;
        debug!(response = %first, "First search response");

        let candidates = extract_candidates(&first);
        match candidates.len() {
            0 => Err(SearchError::NoMatch),
            1 => {
                info!(ids = ?candidates, "Search resolved in one round");
                Ok(candidates)
            }
            n => {
                debug!(candidate_count = n, "Ambiguous answer, asking for an id array");
                messages.push(ChatMessage::assistant(first));
                messages.push(ChatMessage::user(DISAMBIGUATION_PROMPT));

                let second = self.call(&messages, cancel).await?;
                debug!(response = %second, "Disambiguation response");

                let ids = extract_bracketed(&second)?;
                info!(ids = ?ids, "Search resolved after disambiguation");
                Ok(ids)
            }
        }
    }

    /// One backend call, abandoned as soon as `cancel` fires.
    async fn call(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, SearchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SearchError::Cancelled),
            result = self.generator.generate(messages, self.max_tokens) => Ok(result?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ChatRole, GeneratorError, ScriptedGenerator, ScriptedReply};
    use std::time::Duration;

    const CORPUS: &str = "id: `3`\ndescription: `a`\n...\nid: `9`\ndescription: `b`\n";

    fn engine(generator: &Arc<ScriptedGenerator>) -> SearchEngine {
        SearchEngine::new(generator.clone())
    }

    #[tokio::test]
    async fn test_single_number_returns_directly() {
        let generator = Arc::new(ScriptedGenerator::from_texts(["best match is 7"]));
        let ids = engine(&generator)
            .search("staging key", CORPUS, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids, vec![7]);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_round_exchange() {
        let generator = Arc::new(ScriptedGenerator::from_texts(["7"]));
        engine(&generator)
            .search("staging key", CORPUS, &CancellationToken::new())
            .await
            .unwrap();

        let calls = generator.calls();
        let messages = &calls[0].messages;
        assert_eq!(calls[0].max_tokens, 1000);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].text.contains(CORPUS));
        assert!(!messages[0].text.contains("{memos}"));
        assert_eq!(messages[1], ChatMessage::user("staging key"));
    }

    #[tokio::test]
    async fn test_ambiguous_answer_triggers_disambiguation() {
        let generator = Arc::new(ScriptedGenerator::from_texts([
            "candidates: 3 and 9",
            "here: [3, 9]",
        ]));
        let ids = engine(&generator)
            .search("keys", CORPUS, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids, vec![3, 9]);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        let second = &calls[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[2], ChatMessage::assistant("candidates: 3 and 9"));
        assert_eq!(second[3], ChatMessage::user(DISAMBIGUATION_PROMPT));
        assert_eq!(calls[1].max_tokens, calls[0].max_tokens);
    }

    #[tokio::test]
    async fn test_disambiguation_result_replaces_candidates() {
        let generator = Arc::new(ScriptedGenerator::from_texts([
            "maybe 1, 2 or 3",
            "[2, 2, 40]",
        ]));
        let ids = engine(&generator)
            .search("q", CORPUS, &CancellationToken::new())
            .await
            .unwrap();

        // Passed through untouched, duplicates and unknown ids included
        assert_eq!(ids, vec![2, 2, 40]);
    }

    #[tokio::test]
    async fn test_no_number_is_no_match() {
        let generator = Arc::new(ScriptedGenerator::from_texts(["no id present"]));
        let result = engine(&generator)
            .search("q", CORPUS, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SearchError::NoMatch)));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_disambiguation_without_brackets() {
        let generator = Arc::new(ScriptedGenerator::from_texts([
            "3 or 9",
            "I think both 3 and 9",
        ]));
        let result = engine(&generator)
            .search("q", CORPUS, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SearchError::AmbiguousParse(_))));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let generator = Arc::new(ScriptedGenerator::new([ScriptedReply::Empty]));
        let result = engine(&generator)
            .search("q", CORPUS, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SearchError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_backend_failure_in_second_round() {
        let generator = Arc::new(ScriptedGenerator::new([
            ScriptedReply::Text("3 and 9".to_string()),
            ScriptedReply::Fail("connection reset".to_string()),
        ]));
        let result = engine(&generator)
            .search("q", CORPUS, &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(SearchError::Llm(GeneratorError::ApiError(_)))
        ));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_pending_call() {
        let generator = Arc::new(
            ScriptedGenerator::from_texts(["7"]).with_delay(Duration::from_secs(30)),
        );
        let engine = engine(&generator);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            engine.search("q", CORPUS, &cancel),
        )
        .await
        .expect("search should stop once cancelled");

        assert!(matches!(result, Err(SearchError::Cancelled)));
    }

    #[test]
    fn test_max_tokens_is_capped() {
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::from_texts(["1"]));
        assert_eq!(SearchEngine::new(generator.clone()).max_tokens(), 1000);
        assert_eq!(
            SearchEngine::new(generator.clone()).with_max_tokens(4096).max_tokens(),
            1000
        );
        assert_eq!(SearchEngine::new(generator).with_max_tokens(200).max_tokens(), 200);
    }
}
