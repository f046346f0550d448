//! Text generation trait and implementations.
//!
//! The search engine only needs "messages in, text out"; the HTTP backend
//! and the scripted test backend both implement [`TextGenerator`].

mod api;
mod scripted;

pub use api::{ApiGenerator, ApiGeneratorConfig, Provider};
pub use scripted::{RecordedCall, ScriptedGenerator, ScriptedReply};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for generation backends.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Timeout waiting for response")]
    Timeout,

    /// The backend answered without any candidate output
    #[error("Empty response from model")]
    EmptyResponse,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged message in an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Pluggable text-completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `messages`, producing at most `max_tokens` tokens.
    ///
    /// Returns [`GeneratorError::EmptyResponse`] when the backend produced no
    /// candidate output at all.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, GeneratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, ChatRole::System);
        assert_eq!(ChatMessage::user("u").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("a").text, "a");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(ChatRole::System.to_string(), "system");
    }
}
