//! HTTP text generator for the Anthropic Messages API and
//! OpenAI-compatible Chat Completions endpoints.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use memos_types::GeneratorSettings;

use super::{ChatMessage, ChatRole, GeneratorError, TextGenerator};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wire protocol spoken by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
}

impl std::str::FromStr for Provider {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            other => Err(GeneratorError::ConfigError(format!(
                "unknown provider: {other}"
            ))),
        }
    }
}

/// Configuration for the HTTP generator.
#[derive(Debug, Clone)]
pub struct ApiGeneratorConfig {
    /// Wire protocol
    pub provider: Provider,

    /// API base URL (e.g., "https://api.anthropic.com")
    pub base_url: String,

    /// Model to use (e.g., "claude-3-7-sonnet-20250219")
    pub model: String,

    /// API key
    pub api_key: SecretString,

    /// Request timeout
    pub timeout: Duration,
}

impl ApiGeneratorConfig {
    /// Create config for the Anthropic API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Provider::Anthropic,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(60),
        }
    }

    /// Create config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(60),
        }
    }

    /// Build from loaded settings. Fails if the token is missing.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GeneratorError> {
        let api_key = settings
            .require_api_key()
            .map_err(|e| GeneratorError::ConfigError(e.to_string()))?;
        let provider: Provider = settings.provider.parse()?;

        let mut config = match provider {
            Provider::Anthropic => Self::anthropic(api_key, settings.model.clone()),
            Provider::OpenAi => Self::openai(api_key, settings.model.clone()),
        };
        if let Some(base_url) = settings.base_url.as_deref().filter(|u| !u.is_empty()) {
            config.base_url = base_url.to_string();
        }
        config.timeout = Duration::from_secs(settings.timeout_secs);
        Ok(config)
    }

    /// Point the generator at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full request URL for the configured provider.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.provider {
            Provider::Anthropic if base.ends_with("/v1") => format!("{base}/messages"),
            Provider::Anthropic => format!("{base}/v1/messages"),
            Provider::OpenAi => format!("{base}/chat/completions"),
        }
    }
}

/// HTTP-backed text generator.
pub struct ApiGenerator {
    client: Client,
    config: ApiGeneratorConfig,
}

impl ApiGenerator {
    /// Create a new HTTP generator.
    pub fn new(config: ApiGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::ConfigError(e.to_string()))?;

        debug!(
            provider = ?config.provider,
            model = %config.model,
            base_url = %config.base_url,
            "Text generator configured"
        );

        Ok(Self { client, config })
    }

    /// Make an OpenAI-compatible API request.
    async fn make_openai_request(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<OpenAIMessage<'a>>,
        }

        #[derive(Serialize)]
        struct OpenAIMessage<'a> {
            role: ChatRole,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            #[serde(default)]
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessageResponse,
        }

        #[derive(Deserialize)]
        struct OpenAIMessageResponse {
            #[serde(default)]
            content: Option<String>,
        }

        let request = OpenAIRequest {
            model: &self.config.model,
            max_tokens,
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role,
                    content: &m.text,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        let response_body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GeneratorError::EmptyResponse)
    }

    /// Make an Anthropic API request.
    async fn make_anthropic_request(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct AnthropicRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            system: Option<String>,
            messages: Vec<AnthropicMessage<'a>>,
        }

        #[derive(Serialize)]
        struct AnthropicMessage<'a> {
            role: ChatRole,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            #[serde(default)]
            content: Vec<AnthropicContent>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: Option<String>,
        }

        // The Messages API takes system text as a top-level field
        let system_parts: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.text.as_str())
            .collect();
        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens,
            system,
            messages: messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| AnthropicMessage {
                    role: m.role,
                    content: &m.text,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        let response_body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        response_body
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or(GeneratorError::EmptyResponse)
    }
}

fn map_send_error(err: reqwest::Error) -> GeneratorError {
    if err.is_timeout() {
        GeneratorError::Timeout
    } else {
        GeneratorError::ApiError(err.to_string())
    }
}

/// Turn non-success statuses into errors, keeping the body for context.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeneratorError> {
    if response.status() == 429 {
        return Err(GeneratorError::RateLimitExceeded);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(GeneratorError::ApiError(format!("HTTP {}: {}", status, body)));
    }

    Ok(response)
}

#[async_trait]
impl TextGenerator for ApiGenerator {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        debug!(
            message_count = messages.len(),
            max_tokens, "Calling text generation API"
        );

        match self.config.provider {
            Provider::Anthropic => self.make_anthropic_request(messages, max_tokens).await,
            Provider::OpenAi => self.make_openai_request(messages, max_tokens).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchange() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("find the memo"),
            ChatMessage::user("staging key"),
        ]
    }

    #[test]
    fn test_anthropic_config() {
        let config = ApiGeneratorConfig::anthropic("test-key", "claude-3-7-sonnet-20250219");
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_openai_config() {
        let config = ApiGeneratorConfig::openai("test-key", "gpt-4o-mini");
        assert_eq!(config.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_accepts_versioned_base() {
        let config = ApiGeneratorConfig::anthropic("k", "m").with_base_url("http://proxy/v1/");
        assert_eq!(config.endpoint(), "http://proxy/v1/messages");
    }

    #[test]
    fn test_from_settings() {
        let settings = GeneratorSettings {
            api_key: Some("tok".to_string()),
            base_url: Some("http://localhost:9999".to_string()),
            timeout_secs: 5,
            ..GeneratorSettings::default()
        };
        let config = ApiGeneratorConfig::from_settings(&settings).unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_key.expose_secret(), "tok");
    }

    #[test]
    fn test_from_settings_requires_token() {
        let result = ApiGeneratorConfig::from_settings(&GeneratorSettings::default());
        assert!(matches!(result, Err(GeneratorError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_anthropic_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 1000,
                "system": "find the memo",
                "messages": [{ "role": "user", "content": "staging key" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "best match is 7" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ApiGeneratorConfig::anthropic("test-key", "claude-test").with_base_url(server.uri());
        let generator = ApiGenerator::new(config).unwrap();

        let text = generator.generate(&exchange(), 1000).await.unwrap();
        assert_eq!(text, "best match is 7");
    }

    #[tokio::test]
    async fn test_openai_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [
                    { "role": "system", "content": "find the memo" },
                    { "role": "user", "content": "staging key" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "3 and 9" } }]
            })))
            .mount(&server)
            .await;

        let config = ApiGeneratorConfig::openai("test-key", "gpt-test").with_base_url(server.uri());
        let generator = ApiGenerator::new(config).unwrap();

        assert_eq!(generator.generate(&exchange(), 500).await.unwrap(), "3 and 9");
    }

    #[tokio::test]
    async fn test_empty_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let config = ApiGeneratorConfig::anthropic("k", "m").with_base_url(server.uri());
        let generator = ApiGenerator::new(config).unwrap();

        let result = generator.generate(&exchange(), 10).await;
        assert!(matches!(result, Err(GeneratorError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_rate_limit_and_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let config = ApiGeneratorConfig::anthropic("k", "m").with_base_url(server.uri());
        let generator = ApiGenerator::new(config).unwrap();

        let first = generator.generate(&exchange(), 10).await;
        assert!(matches!(first, Err(GeneratorError::RateLimitExceeded)));

        match generator.generate(&exchange(), 10).await {
            Err(GeneratorError::ApiError(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = ApiGeneratorConfig::openai("k", "m").with_base_url(server.uri());
        let generator = ApiGenerator::new(config).unwrap();

        let result = generator.generate(&exchange(), 10).await;
        assert!(matches!(result, Err(GeneratorError::ParseError(_))));
    }
}
