//! Scripted generator for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{ChatMessage, GeneratorError, TextGenerator};

/// One canned backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Behave like a backend that returned no candidates
    Empty,
    /// Fail the call with an API error carrying this message
    Fail(String),
}

/// A recorded call made against the scripted generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Generator that replays scripted answers in order.
///
/// Useful for testing without making API calls. Every call is recorded so
/// tests can assert on the exchange that was sent.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    /// Create a generator that answers with `replies`, one per call.
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a generator that answers with plain text replies.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    /// Sleep before answering, to exercise cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                max_tokens,
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .map_err(|_| GeneratorError::ApiError("script lock poisoned".to_string()))?
            .pop_front();

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Empty) => Err(GeneratorError::EmptyResponse),
            Some(ScriptedReply::Fail(message)) => Err(GeneratorError::ApiError(message)),
            None => Err(GeneratorError::ApiError("no scripted reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let generator = ScriptedGenerator::from_texts(["first", "second"]);
        let messages = vec![ChatMessage::user("q")];

        assert_eq!(generator.generate(&messages, 10).await.unwrap(), "first");
        assert_eq!(generator.generate(&messages, 20).await.unwrap(), "second");
        assert!(generator.generate(&messages, 30).await.is_err());

        let calls = generator.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].max_tokens, 20);
        assert_eq!(calls[0].messages, messages);
    }

    #[tokio::test]
    async fn test_empty_and_failure_replies() {
        let generator = ScriptedGenerator::new([
            ScriptedReply::Empty,
            ScriptedReply::Fail("down".to_string()),
        ]);

        let result = generator.generate(&[], 1).await;
        assert!(matches!(result, Err(GeneratorError::EmptyResponse)));

        match generator.generate(&[], 1).await {
            Err(GeneratorError::ApiError(msg)) => assert_eq!(msg, "down"),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }
}
